//! Core types for network representation.

use std::fmt;

use serde::Serialize;

/// Index of a combinator in the flat network, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CombinatorId(pub usize);

impl fmt::Display for CombinatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Which side of a combinator a wire attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Input,
    Output,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Input => write!(f, "in"),
            Side::Output => write!(f, "out"),
        }
    }
}

/// A cell of the layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct GridPosition {
    /// Column, `0..clique_size`
    pub x: usize,
    /// Row
    pub y: usize,
}

impl GridPosition {
    /// Position of the n-th slot of the position stream.
    pub fn from_slot(slot: usize, row_width: usize) -> Self {
        Self {
            x: slot % row_width,
            y: slot / row_width,
        }
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
