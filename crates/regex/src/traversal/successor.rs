use lazynfa_utils::bitset::Bitset;

use crate::ast::{Ast, NodeId};

use super::path::{self, PathElement, QuantifierGuard};

/// A successor found by a traversal together with the path that reached it.
/// Only valid during the visit callback.
#[derive(Debug)]
pub struct Successor<'a> {
    pub(crate) ast: &'a Ast,
    pub(crate) root: NodeId,
    pub(crate) target: NodeId,
    pub(crate) path: &'a [PathElement],
    pub(crate) guards: &'a [QuantifierGuard],
    pub(crate) dollars: &'a Bitset,
    pub(crate) look_arounds: &'a Bitset,
}

impl<'a> Successor<'a> {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Character class, back-reference, opaque look-around or match found
    /// node reached
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn is_match_found(&self) -> bool {
        self.ast.node(self.target).is_match_found()
    }

    /// Path from the root to the target, the target being the last element
    pub fn path(&self) -> &'a [PathElement] {
        self.path
    }

    /// Quantifier guards in path order
    pub fn guards(&self) -> &'a [QuantifierGuard] {
        self.guards
    }

    /// `$` assertions passed on the way to the target
    pub fn dollars(&self) -> impl Iterator<Item = NodeId> + 'a {
        self.dollars.iter().map(|i| NodeId::from(i as u32))
    }

    /// Look-arounds descended into on the way to the target
    pub fn look_arounds(&self) -> impl Iterator<Item = NodeId> + 'a {
        self.look_arounds.iter().map(|i| NodeId::from(i as u32))
    }

    /// Whether the transition depends on assertions that can only be
    /// checked at match time
    pub fn has_conditions(&self) -> bool {
        !self.dollars.is_empty() || !self.look_arounds.is_empty()
    }

    /// Capture boundary indices updated by taking this transition
    pub fn group_boundaries(&self) -> Bitset {
        path::group_boundaries(self.ast, self.path)
    }
}

/// Receives the successors of a traversal
pub trait SuccessorVisitor {
    fn visit(&mut self, successor: &Successor<'_>);
}

impl<F> SuccessorVisitor for F
where
    F: FnMut(&Successor<'_>),
{
    fn visit(&mut self, successor: &Successor<'_>) {
        self(successor)
    }
}
