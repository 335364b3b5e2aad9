use std::fmt;

use smallvec::SmallVec;

use super::{CodePointSet, NodeId};

/// Repetition bounds attached to a group or to an unrolled term copy
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Quantifier {
    pub min: u32,
    /// None means unbounded
    pub max: Option<u32>,
    pub greedy: bool,
}

impl Quantifier {
    pub fn new(min: u32, max: Option<u32>, greedy: bool) -> Quantifier {
        Quantifier { min, max, greedy }
    }

    pub fn star(greedy: bool) -> Quantifier {
        Quantifier::new(0, None, greedy)
    }

    pub fn plus(greedy: bool) -> Quantifier {
        Quantifier::new(1, None, greedy)
    }

    pub fn optional(greedy: bool) -> Quantifier {
        Quantifier::new(0, Some(1), greedy)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, None) => write!(f, "*")?,
            (1, None) => write!(f, "+")?,
            (0, Some(1)) => write!(f, "?")?,
            (n, None) => write!(f, "{{{n},}}")?,
            (n, Some(m)) if n == m => write!(f, "{{{n}}}")?,
            (n, Some(m)) => write!(f, "{{{n},{m}}}")?,
        }

        if !self.greedy {
            write!(f, "?")?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum AssertionKind {
    /// `^`
    Caret,
    /// `$`
    Dollar,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum LookAroundKind {
    Ahead,
    Behind,
}

#[derive(Debug, Clone, Default)]
pub struct Group {
    /// Alternatives in priority order, all sequences
    pub alternatives: SmallVec<[NodeId; 2]>,
    pub is_loop: bool,
    /// Iterations of this group are rejected at runtime if they match
    /// nothing
    pub has_empty_guard: bool,
    /// Group is an unrolled copy of a bounded quantifier, its empty
    /// alternative is artificial
    pub is_expanded_quantifier: bool,
    /// Capture group number, None if non-capturing
    pub capture: Option<u32>,
}

impl Group {
    /// Boundary indices of this capture group as (start, end)
    pub fn boundaries(&self) -> Option<(usize, usize)> {
        self.capture
            .map(|n| (n as usize * 2, n as usize * 2 + 1))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sequence {
    pub terms: Vec<NodeId>,
}

impl Sequence {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.terms.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.terms.last().copied()
    }
}

#[derive(Debug, Clone)]
pub struct LookAround {
    pub kind: LookAroundKind,
    pub negated: bool,
    pub group: NodeId,
    pub match_found: NodeId,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Synthetic root of the whole expression
    Root { group: NodeId, match_found: NodeId },
    Group(Group),
    Sequence(Sequence),
    CharacterClass(CodePointSet),
    BackReference { group_number: u32 },
    PositionAssertion(AssertionKind),
    LookAround(LookAround),
    MatchFound,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    /// Index of this term in its parent sequence
    pub(crate) seq_index: usize,
    pub(crate) quantifier: Option<Quantifier>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(parent: Option<NodeId>, kind: NodeKind) -> Node {
        Node {
            parent,
            seq_index: 0,
            quantifier: None,
            kind,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn seq_index(&self) -> usize {
        self.seq_index
    }

    pub fn quantifier(&self) -> Option<&Quantifier> {
        self.quantifier.as_ref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_subtree_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root { .. } | NodeKind::LookAround(_))
    }

    pub fn is_match_found(&self) -> bool {
        matches!(self.kind, NodeKind::MatchFound)
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            NodeKind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.kind {
            NodeKind::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_look_around(&self) -> Option<&LookAround> {
        match &self.kind {
            NodeKind::LookAround(la) => Some(la),
            _ => None,
        }
    }
}
