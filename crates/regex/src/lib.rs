//! Lazy NFA successor computation over a regex syntax tree.
//!
//! Build an [`Ast`], run [`Ast::analyze`] and walk it with an
//! [`NfaTraversal`] to enumerate the transitions leaving any term without
//! materializing the automaton.

mod analysis;
mod ast;
mod error;
mod traversal;

pub use analysis::MinPathPass;
pub use ast::{
    AssertionKind, Ast, CodePointSet, Direction, Group, LookAround, LookAroundKind, Node,
    NodeDisplay, NodeFlags, NodeId, NodeKind, Quantifier, Sequence,
};
pub use error::TraversalError;
pub use traversal::{
    Action, GuardKind, NfaTraversal, PathElement, QuantifierGuard, Successor, SuccessorVisitor,
    TraversalConfig, TraversalStats, DEDUPLICATION_LIMIT,
};
