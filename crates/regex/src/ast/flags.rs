use serde::Deserialize;

/// Direction terms of a sequence are visited in
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn is_reverse(&self) -> bool {
        matches!(self, Direction::Reverse)
    }

    pub(crate) fn slot(&self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }
}

impl From<bool> for Direction {
    fn from(reverse: bool) -> Self {
        if reverse {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

/// Analysis results for a single node, written by the min-path pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    pub dead: bool,
    /// Minimum number of character classes to reach the node, per direction
    pub min_path: [u32; 2],
    pub starts_with_caret: bool,
    pub ends_with_dollar: bool,
}

impl NodeFlags {
    pub fn min_path(&self, direction: Direction) -> u32 {
        self.min_path[direction.slot()]
    }
}
