use crate::ast::{AssertionKind, Ast, Direction, NodeId, NodeKind};

#[derive(Debug)]
struct Frame {
    node: NodeId,
    next: usize,
}

/// Depth first pass computing minimum path lengths, dead position
/// assertions and caret/dollar markers.
///
/// Forward runs mark `^` assertions, reverse runs mark `$` assertions. Run
/// both through [`Ast::analyze`] before traversing the tree.
pub struct MinPathPass<'a> {
    ast: &'a mut Ast,
    direction: Direction,
    dead: usize,
}

impl<'a> MinPathPass<'a> {
    pub fn run(ast: &'a mut Ast, root: NodeId, reverse: bool) {
        let mut pass = MinPathPass {
            ast,
            direction: Direction::from(reverse),
            dead: 0,
        };

        let mut stack = vec![Frame { node: root, next: 0 }];
        pass.enter(root);

        while let Some(frame) = stack.last_mut() {
            match pass.child(frame.node, frame.next) {
                Some(child) => {
                    frame.next += 1;
                    pass.enter(child);
                    stack.push(Frame {
                        node: child,
                        next: 0,
                    });
                }
                None => {
                    let node = frame.node;
                    stack.pop();
                    pass.leave(node);
                }
            }
        }

        log::debug!(
            "Min path pass {:?} from {:?}: {} nodes marked dead",
            pass.direction,
            root,
            pass.dead
        );
    }

    /// The i:th child to visit, sequences are visited in scan direction
    fn child(&self, node: NodeId, i: usize) -> Option<NodeId> {
        match self.ast.kind(node) {
            NodeKind::Root { group, .. } => (i == 0).then_some(*group),
            NodeKind::LookAround(la) => (i == 0).then_some(la.group),
            NodeKind::Group(g) => g.alternatives.get(i).copied(),
            NodeKind::Sequence(s) => {
                if i >= s.terms.len() {
                    return None;
                }

                let i = if self.direction.is_reverse() {
                    s.terms.len() - 1 - i
                } else {
                    i
                };
                Some(s.terms[i])
            }
            NodeKind::CharacterClass(_)
            | NodeKind::BackReference { .. }
            | NodeKind::PositionAssertion(_)
            | NodeKind::MatchFound => None,
        }
    }

    fn min_path(&self, node: NodeId) -> u32 {
        self.ast.flags(node).min_path[self.direction.slot()]
    }

    fn set_min_path(&mut self, node: NodeId, value: u32) {
        let d = self.direction.slot();
        self.ast.flags_mut(node).min_path[d] = value;
    }

    fn mark_dead(&mut self, node: NodeId) {
        let flags = self.ast.flags_mut(node);
        if !flags.dead {
            flags.dead = true;
            self.dead += 1;
            log::trace!("Marked {node:?} dead");
        }
    }

    /// Set the anchor flag this direction computes
    fn set_anchored(&mut self, node: NodeId, value: bool) {
        let flags = self.ast.flags_mut(node);
        match self.direction {
            Direction::Forward => flags.starts_with_caret = value,
            Direction::Reverse => flags.ends_with_dollar = value,
        }
    }

    fn is_anchored(&self, node: NodeId) -> bool {
        let flags = self.ast.flags(node);
        match self.direction {
            Direction::Forward => flags.starts_with_caret,
            Direction::Reverse => flags.ends_with_dollar,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.ast.parent(node)
    }

    fn enter(&mut self, node: NodeId) {
        match self.ast.kind(node) {
            NodeKind::Group(_) => {
                let entry = match self.parent(node) {
                    Some(parent) if !matches!(self.ast.kind(parent), NodeKind::Root { .. }) => {
                        self.min_path(parent)
                    }
                    _ => 0,
                };
                self.set_min_path(node, entry);
                self.set_anchored(node, false);
            }
            NodeKind::Sequence(_) => {
                let entry = self.parent(node).map(|g| self.min_path(g)).unwrap_or(0);
                self.set_min_path(node, entry);
                self.set_anchored(node, false);
            }
            NodeKind::CharacterClass(_) => {
                if let Some(seq) = self.parent(node) {
                    let value = self.min_path(seq) + 1;
                    self.set_min_path(seq, value);
                }
            }
            NodeKind::PositionAssertion(kind) => {
                let active = match self.direction {
                    Direction::Forward => *kind == AssertionKind::Caret,
                    Direction::Reverse => *kind == AssertionKind::Dollar,
                };
                let Some(seq) = self.parent(node) else {
                    return;
                };

                let value = self.min_path(seq);
                self.set_min_path(node, value);
                if !active {
                    return;
                }

                if value > 0 {
                    self.mark_dead(node);
                    self.mark_dead(seq);
                } else {
                    self.set_anchored(seq, true);
                }
            }
            NodeKind::LookAround(_) => {
                if let Some(seq) = self.parent(node) {
                    let value = self.min_path(seq);
                    self.set_min_path(node, value);
                }
                self.set_anchored(node, false);
            }
            NodeKind::Root { .. } | NodeKind::BackReference { .. } | NodeKind::MatchFound => {}
        }
    }

    fn leave(&mut self, node: NodeId) {
        match self.ast.kind(node) {
            NodeKind::Group(g) => {
                let mut min = None;
                let mut anchored = true;
                for alt in g.alternatives.iter() {
                    if self.ast.is_dead(*alt) {
                        continue;
                    }

                    let path = self.min_path(*alt);
                    min = Some(min.map_or(path, |m: u32| m.min(path)));
                    anchored &= self.is_anchored(*alt);
                }

                let Some(min) = min else {
                    self.mark_dead(node);
                    if let Some(seq) = self.enclosing_sequence(node) {
                        self.mark_dead(seq);
                    }
                    return;
                };

                self.set_min_path(node, min);
                self.set_anchored(node, anchored);

                if let Some(seq) = self.enclosing_sequence(node) {
                    self.set_min_path(seq, min);
                    if anchored {
                        self.set_anchored(seq, true);
                    }
                }
            }
            NodeKind::LookAround(la) => {
                if la.negated {
                    return;
                }

                let group = la.group;
                let enclosing = self.enclosing_sequence(node);
                if self.ast.is_dead(group) {
                    self.mark_dead(node);
                    if let Some(seq) = enclosing {
                        self.mark_dead(seq);
                    }
                } else if self.is_anchored(group) {
                    self.set_anchored(node, true);
                    if let Some(seq) = enclosing {
                        self.set_anchored(seq, true);
                    }
                }
            }
            NodeKind::Root { .. }
            | NodeKind::Sequence(_)
            | NodeKind::CharacterClass(_)
            | NodeKind::BackReference { .. }
            | NodeKind::PositionAssertion(_)
            | NodeKind::MatchFound => {}
        }
    }

    fn enclosing_sequence(&self, term: NodeId) -> Option<NodeId> {
        let parent = self.parent(term)?;
        matches!(self.ast.kind(parent), NodeKind::Sequence(_)).then_some(parent)
    }
}
