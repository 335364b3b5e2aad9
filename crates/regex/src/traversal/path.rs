use lazynfa_utils::bitset::Bitset;

use crate::ast::{Ast, NodeId, Quantifier};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Action {
    /// Group entered, alternative `alt_index - 1` is being walked
    Enter,
    /// Group left through the end of an alternative
    Exit,
    /// Unrolled quantifier group skipped through its artificial empty
    /// alternative
    PassThrough,
    /// Any other node on the path: assertions, look-arounds and the target
    Node,
}

/// Single step of a traversal path
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct PathElement {
    pub node: NodeId,
    pub action: Action,
    /// Next alternative to try when backtracking into a group. Alternatives
    /// are nodes so their count always fits in a node id.
    pub alt_index: u32,
}

impl PathElement {
    pub(crate) fn enter(group: NodeId) -> PathElement {
        PathElement {
            node: group,
            action: Action::Enter,
            alt_index: 1,
        }
    }

    pub(crate) fn exit(group: NodeId) -> PathElement {
        PathElement {
            node: group,
            action: Action::Exit,
            alt_index: 0,
        }
    }

    pub(crate) fn node(node: NodeId) -> PathElement {
        PathElement {
            node,
            action: Action::Node,
            alt_index: 0,
        }
    }

    pub fn is_group_enter(&self) -> bool {
        matches!(self.action, Action::Enter | Action::PassThrough)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum GuardKind {
    Enter,
    Exit,
}

/// Marks a quantified node being entered or left on a path. Repetition
/// bounds are checked against these at match time.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct QuantifierGuard {
    pub node: NodeId,
    pub quantifier: Quantifier,
    pub kind: GuardKind,
}

impl QuantifierGuard {
    fn is(&self, node: NodeId, kind: GuardKind) -> bool {
        self.node == node && self.kind == kind
    }
}

/// Collect the quantifier guards of a path into `out`.
///
/// `root_left` is set when the walk started by leaving the root term rather
/// than entering it.
pub(crate) fn quantifier_guards(
    ast: &Ast,
    root: NodeId,
    root_left: bool,
    path: &[PathElement],
    target: NodeId,
    out: &mut Vec<QuantifierGuard>,
) {
    out.clear();

    if root_left {
        if let Some(q) = ast.node(root).quantifier() {
            out.push(QuantifierGuard {
                node: root,
                quantifier: *q,
                kind: GuardKind::Exit,
            });
        }
    }

    for element in path {
        let kind = match element.action {
            Action::Enter => GuardKind::Enter,
            Action::Exit => GuardKind::Exit,
            Action::PassThrough | Action::Node => continue,
        };
        let Some(q) = ast.node(element.node).quantifier() else {
            continue;
        };

        // Exit, Enter, Exit of the same loop is a zero width iteration
        // followed by leaving, same as leaving right away
        if kind == GuardKind::Exit {
            if let [.., exit, enter] = out.as_slice() {
                if exit.is(element.node, GuardKind::Exit) && enter.is(element.node, GuardKind::Enter)
                {
                    out.pop();
                    continue;
                }
            }
        }

        out.push(QuantifierGuard {
            node: element.node,
            quantifier: *q,
            kind,
        });
    }

    if let Some(q) = ast.node(target).quantifier() {
        out.push(QuantifierGuard {
            node: target,
            quantifier: *q,
            kind: GuardKind::Enter,
        });
    }
}

/// Capture boundary indices updated along a path. Entering a capture group
/// updates its start boundary and exiting it updates its end boundary.
pub(crate) fn group_boundaries(ast: &Ast, path: &[PathElement]) -> Bitset {
    let mut boundaries = Bitset::new();
    for element in path {
        let Some((start, end)) = ast.group(element.node).and_then(|g| g.boundaries()) else {
            continue;
        };

        match element.action {
            Action::Enter => {
                boundaries.insert(start);
            }
            Action::Exit => {
                boundaries.insert(end);
            }
            Action::PassThrough | Action::Node => {}
        }
    }
    boundaries
}
