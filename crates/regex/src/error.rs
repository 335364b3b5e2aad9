use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraversalError {
    #[error("Too many duplicate successors, gave up after {limit}")]
    Explosion { limit: usize },

    #[error("Traversal invariant violated: {0}")]
    Invariant(&'static str),
}
