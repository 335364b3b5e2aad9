use serde::Deserialize;

use crate::ast::Direction;

/// Options shared by all runs of a traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    pub direction: Direction,
    /// Pass through `^` assertions instead of treating them as a dead end
    pub can_traverse_caret: bool,
    /// Descend into positive look-arounds instead of reporting them as
    /// opaque targets
    pub can_traverse_look_arounds: bool,
}

impl TraversalConfig {
    pub fn forward() -> TraversalConfig {
        TraversalConfig::default()
    }

    pub fn reverse() -> TraversalConfig {
        TraversalConfig {
            direction: Direction::Reverse,
            ..TraversalConfig::default()
        }
    }

    pub fn with_caret(mut self, traverse: bool) -> TraversalConfig {
        self.can_traverse_caret = traverse;
        self
    }

    pub fn with_look_arounds(mut self, traverse: bool) -> TraversalConfig {
        self.can_traverse_look_arounds = traverse;
        self
    }

    pub fn is_reverse(&self) -> bool {
        self.direction.is_reverse()
    }
}
