mod charset;
mod flags;
mod node;

use std::fmt;

use lazynfa_utils::{id_type, idvec::IdVec};

pub use charset::CodePointSet;
pub use flags::{Direction, NodeFlags};
pub use node::{
    AssertionKind, Group, LookAround, LookAroundKind, Node, NodeKind, Quantifier, Sequence,
};

use crate::analysis::MinPathPass;

id_type!(pub NodeId);

/// Regex syntax tree stored in an arena.
///
/// Node shape is fixed once built. Analysis results live in a side table
/// indexed by node id and are filled by [`Ast::analyze`].
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: IdVec<NodeId, Node>,
    flags: IdVec<NodeId, NodeFlags>,
    root: NodeId,
    analyzed: bool,
}

impl Ast {
    /// Create an expression with an empty top-level group
    pub fn new() -> Ast {
        let mut nodes: IdVec<NodeId, Node> = IdVec::new();
        let root = nodes.next_id();
        let group = NodeId::from(root.0 + 1);
        let match_found = NodeId::from(root.0 + 2);

        nodes.push(Node::new(None, NodeKind::Root { group, match_found }));
        nodes.push(Node::new(Some(root), NodeKind::Group(Group::default())));
        nodes.push(Node::new(Some(root), NodeKind::MatchFound));

        let flags = IdVec::filled(nodes.len(), NodeFlags::default());
        Ast {
            nodes,
            flags,
            root,
            analyzed: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The top-level group, entering it yields the initial successors
    pub fn root_group(&self) -> NodeId {
        match self.nodes[self.root].kind {
            NodeKind::Root { group, .. } => group,
            _ => unreachable!("root node is always a subtree root"),
        }
    }

    pub fn root_match_found(&self) -> NodeId {
        match self.nodes[self.root].kind {
            NodeKind::Root { match_found, .. } => match_found,
            _ => unreachable!("root node is always a subtree root"),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn group(&self, id: NodeId) -> Option<&Group> {
        self.nodes[id].as_group()
    }

    pub fn sequence(&self, id: NodeId) -> Option<&Sequence> {
        self.nodes[id].as_sequence()
    }

    /// Group owned by a look-around assertion
    pub fn look_around_group(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].as_look_around().map(|la| la.group)
    }

    pub fn flags(&self, id: NodeId) -> &NodeFlags {
        &self.flags[id]
    }

    pub(crate) fn flags_mut(&mut self, id: NodeId) -> &mut NodeFlags {
        &mut self.flags[id]
    }

    pub fn is_dead(&self, id: NodeId) -> bool {
        self.flags[id].dead
    }

    pub fn min_path(&self, id: NodeId, direction: Direction) -> u32 {
        self.flags[id].min_path(direction)
    }

    pub fn is_analyzed(&self) -> bool {
        self.analyzed
    }

    /// Run the min-path pass in both directions over the whole tree.
    /// Previous results are discarded.
    pub fn analyze(&mut self) {
        self.flags = IdVec::filled(self.nodes.len(), NodeFlags::default());
        let root = self.root;
        MinPathPass::run(self, root, false);
        MinPathPass::run(self, root, true);
        self.analyzed = true;
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        self.analyzed = false;
        let id = self.nodes.push(Node::new(Some(parent), kind));
        self.flags.resize(self.nodes.len(), NodeFlags::default());
        id
    }

    /// Add a new alternative to a group
    pub fn add_sequence(&mut self, group: NodeId) -> NodeId {
        assert!(
            self.group(group).is_some(),
            "sequences can only be added to groups"
        );
        let seq = self.push(group, NodeKind::Sequence(Sequence::default()));
        if let NodeKind::Group(g) = &mut self.nodes[group].kind {
            g.alternatives.push(seq);
        }
        seq
    }

    fn add_term(&mut self, seq: NodeId, kind: NodeKind) -> NodeId {
        let index = match self.sequence(seq) {
            Some(s) => s.terms.len(),
            None => panic!("terms can only be added to sequences"),
        };

        let term = self.push(seq, kind);
        self.nodes[term].seq_index = index;
        if let NodeKind::Sequence(s) = &mut self.nodes[seq].kind {
            s.terms.push(term);
        }
        term
    }

    pub fn add_group(&mut self, seq: NodeId) -> NodeId {
        self.add_term(seq, NodeKind::Group(Group::default()))
    }

    pub fn add_capture_group(&mut self, seq: NodeId, number: u32) -> NodeId {
        let group = Group {
            capture: Some(number),
            ..Group::default()
        };
        self.add_term(seq, NodeKind::Group(group))
    }

    pub fn add_char_class(&mut self, seq: NodeId, set: CodePointSet) -> NodeId {
        self.add_term(seq, NodeKind::CharacterClass(set))
    }

    pub fn add_literal(&mut self, seq: NodeId, ch: char) -> NodeId {
        self.add_char_class(seq, CodePointSet::single(ch))
    }

    /// Add one character class per char of `text`
    pub fn add_literals(&mut self, seq: NodeId, text: &str) {
        for ch in text.chars() {
            self.add_literal(seq, ch);
        }
    }

    pub fn add_back_reference(&mut self, seq: NodeId, group_number: u32) -> NodeId {
        self.add_term(seq, NodeKind::BackReference { group_number })
    }

    pub fn add_caret(&mut self, seq: NodeId) -> NodeId {
        self.add_term(seq, NodeKind::PositionAssertion(AssertionKind::Caret))
    }

    pub fn add_dollar(&mut self, seq: NodeId) -> NodeId {
        self.add_term(seq, NodeKind::PositionAssertion(AssertionKind::Dollar))
    }

    pub fn add_look_ahead(&mut self, seq: NodeId, negated: bool) -> NodeId {
        self.add_look_around(seq, LookAroundKind::Ahead, negated)
    }

    pub fn add_look_behind(&mut self, seq: NodeId, negated: bool) -> NodeId {
        self.add_look_around(seq, LookAroundKind::Behind, negated)
    }

    fn add_look_around(&mut self, seq: NodeId, kind: LookAroundKind, negated: bool) -> NodeId {
        let la = self.nodes.next_id();
        let group = NodeId::from(la.0 + 1);
        let match_found = NodeId::from(la.0 + 2);
        let look_around = LookAround {
            kind,
            negated,
            group,
            match_found,
        };

        let la = self.add_term(seq, NodeKind::LookAround(look_around));
        self.push(la, NodeKind::Group(Group::default()));
        self.push(la, NodeKind::MatchFound);
        la
    }

    /// Add a looping group repeated according to `quantifier`. The loop is
    /// left through an empty alternative, ordered by greediness.
    /// Returns the group and its body sequence.
    pub fn add_repeat(&mut self, seq: NodeId, quantifier: Quantifier) -> (NodeId, NodeId) {
        let group = self.add_group(seq);
        self.set_loop(group, true);
        self.set_quantifier(group, quantifier);
        let body = self.add_quantified_alternatives(group, quantifier.greedy);
        (group, body)
    }

    pub fn add_star(&mut self, seq: NodeId, greedy: bool) -> (NodeId, NodeId) {
        self.add_repeat(seq, Quantifier::star(greedy))
    }

    pub fn add_plus(&mut self, seq: NodeId, greedy: bool) -> (NodeId, NodeId) {
        self.add_repeat(seq, Quantifier::plus(greedy))
    }

    /// Add an optional group `(?:body)?`
    pub fn add_optional(&mut self, seq: NodeId, greedy: bool) -> (NodeId, NodeId) {
        let group = self.add_group(seq);
        self.set_quantifier(group, Quantifier::optional(greedy));
        let body = self.add_quantified_alternatives(group, greedy);
        (group, body)
    }

    /// Add an unrolled optional iteration of `quantifier`
    pub fn add_expanded_optional(
        &mut self,
        seq: NodeId,
        quantifier: Quantifier,
    ) -> (NodeId, NodeId) {
        let group = self.add_group(seq);
        self.set_quantifier(group, quantifier);
        if let NodeKind::Group(g) = &mut self.nodes[group].kind {
            g.is_expanded_quantifier = true;
        }
        let body = self.add_quantified_alternatives(group, quantifier.greedy);
        (group, body)
    }

    fn add_quantified_alternatives(&mut self, group: NodeId, greedy: bool) -> NodeId {
        if greedy {
            let body = self.add_sequence(group);
            self.add_sequence(group);
            body
        } else {
            self.add_sequence(group);
            self.add_sequence(group)
        }
    }

    pub fn set_quantifier(&mut self, term: NodeId, quantifier: Quantifier) {
        self.analyzed = false;
        self.nodes[term].quantifier = Some(quantifier);
    }

    pub fn set_loop(&mut self, group: NodeId, is_loop: bool) {
        self.analyzed = false;
        if let NodeKind::Group(g) = &mut self.nodes[group].kind {
            g.is_loop = is_loop;
        }
    }

    pub fn set_empty_guard(&mut self, group: NodeId, guard: bool) {
        if let NodeKind::Group(g) = &mut self.nodes[group].kind {
            g.has_empty_guard = guard;
        }
    }

    /// Display a single node as regex-like text
    pub fn display(&self, id: NodeId) -> NodeDisplay<'_> {
        NodeDisplay { ast: self, id }
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Root { group, .. } => return self.fmt_alternatives(*group, f),
            NodeKind::Group(g) => {
                let open = if g.capture.is_some() { "(" } else { "(?:" };
                write!(f, "{open}")?;
                self.fmt_alternatives(id, f)?;
                write!(f, ")")?;
            }
            NodeKind::Sequence(s) => {
                for term in &s.terms {
                    self.fmt_node(*term, f)?;
                }
            }
            NodeKind::CharacterClass(set) => write!(f, "{set}")?,
            NodeKind::BackReference { group_number } => write!(f, "\\{group_number}")?,
            NodeKind::PositionAssertion(AssertionKind::Caret) => write!(f, "^")?,
            NodeKind::PositionAssertion(AssertionKind::Dollar) => write!(f, "$")?,
            NodeKind::LookAround(la) => {
                let open = match (la.kind, la.negated) {
                    (LookAroundKind::Ahead, false) => "(?=",
                    (LookAroundKind::Ahead, true) => "(?!",
                    (LookAroundKind::Behind, false) => "(?<=",
                    (LookAroundKind::Behind, true) => "(?<!",
                };
                write!(f, "{open}")?;
                self.fmt_alternatives(la.group, f)?;
                write!(f, ")")?;
            }
            NodeKind::MatchFound => write!(f, "<match>")?,
        }

        if let Some(q) = &node.quantifier {
            write!(f, "{q}")?;
        }

        Ok(())
    }

    fn fmt_alternatives(&self, group: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(g) = self.group(group) else {
            return Ok(());
        };

        // Empty alternatives of quantified groups are structural and implied
        // by the quantifier
        let quantified = self.nodes[group].quantifier.is_some();
        let shown = g.alternatives.iter().filter(|alt| {
            !quantified
                || self
                    .sequence(**alt)
                    .map(|s| !s.is_empty())
                    .unwrap_or(true)
        });

        for (i, alt) in shown.enumerate() {
            if i != 0 {
                write!(f, "|")?;
            }
            self.fmt_node(*alt, f)?;
        }

        Ok(())
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}

pub struct NodeDisplay<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> fmt::Display for NodeDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ast.fmt_node(self.id, f)
    }
}
