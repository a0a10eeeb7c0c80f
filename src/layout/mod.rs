//! Grid layout, relay poles and wire segments.
//!
//! Combinators are placed in declaration order into rows of
//! [`LayoutConfig::clique_size`] cells. Two connection points may be wired
//! directly when their rows differ by less than the clique size; longer wires
//! are routed through relay [`Pole`]s spliced into the position stream.
//!
//! ```text
//! slot:  0  1  2  3  4
//!        5  6  7  8  9      row = slot / clique_size
//!       10 11 12 13 14      x   = slot % clique_size
//! ```

mod segmenter;

pub use segmenter::Segmenter;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::circuit::{CombinatorId, GridPosition, Side};
use crate::solver::Color;

/// Default row width of the layout grid.
pub const CLIQUE_SIZE: usize = 5;

/// Layout parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Row width, and the row distance below which wires connect directly
    pub clique_size: usize,
    /// How many recently created poles may absorb further wires
    pub recent_pole_window: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            clique_size: CLIQUE_SIZE,
            recent_pole_window: CLIQUE_SIZE,
        }
    }
}

impl LayoutConfig {
    /// Set the clique size. Values below 2 leave no room for relays and are
    /// raised to 2.
    pub fn with_clique_size(mut self, clique_size: usize) -> Self {
        self.clique_size = clique_size.max(2);
        self
    }

    /// Set the number of recent poles considered for merging.
    pub fn with_recent_pole_window(mut self, window: usize) -> Self {
        self.recent_pole_window = window.max(1);
        self
    }
}

/// A node of the position stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "index", rename_all = "lowercase")]
pub enum NodeRef {
    Combinator(CombinatorId),
    Pole(usize),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Combinator(id) => write!(f, "{}", id),
            NodeRef::Pole(index) => write!(f, "P{}", index),
        }
    }
}

/// Where one end of a wire segment attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Endpoint {
    Combinator { id: CombinatorId, side: Side },
    Pole { index: usize },
}

impl Endpoint {
    pub fn node(&self) -> NodeRef {
        match self {
            Endpoint::Combinator { id, .. } => NodeRef::Combinator(*id),
            Endpoint::Pole { index } => NodeRef::Pole(*index),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Combinator { id, side } => write!(f, "{}.{}", id, side),
            Endpoint::Pole { index } => write!(f, "P{}", index),
        }
    }
}

/// A zero-logic relay carrying up to two wires of each color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pole {
    pub index: usize,
    pub slot: usize,
    pub position: GridPosition,
    /// Carried wires in the order they were attached
    pub wires: Vec<String>,
}

/// Maximum number of wires on one pole.
pub const POLE_CAPACITY: usize = 4;

/// Maximum number of same-colored wires on one pole.
pub const POLE_COLOR_CAPACITY: usize = 2;

/// A direct wire between two consecutive connection points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireSegment {
    pub wire: String,
    pub color: Color,
    pub from: Endpoint,
    pub to: Endpoint,
}

impl fmt::Display for WireSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {} -> {}", self.wire, self.color, self.from, self.to)
    }
}

/// Result of laying out a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub clique_size: usize,
    /// Wire colors the segments were tagged with
    pub colors: BTreeMap<String, Color>,
    /// The position stream, one node per grid cell
    pub slots: Vec<NodeRef>,
    /// Grid cell of each combinator, indexed by combinator id
    pub positions: Vec<GridPosition>,
    pub poles: Vec<Pole>,
    segments: Vec<WireSegment>,
}

impl Layout {
    /// Wire segments in emission order.
    pub fn segments(&self) -> &[WireSegment] {
        &self.segments
    }

    /// Grid cell of a combinator or pole.
    pub fn position(&self, node: NodeRef) -> Option<GridPosition> {
        match node {
            NodeRef::Combinator(id) => self.positions.get(id.0).copied(),
            NodeRef::Pole(index) => self.poles.get(index).map(|p| p.position),
        }
    }

    /// Grid rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[NodeRef]> {
        self.slots.chunks(self.clique_size.max(1))
    }

    /// Number of rows between the two ends of a segment.
    pub fn row_distance(&self, segment: &WireSegment) -> Option<usize> {
        let from = self.position(segment.from.node())?;
        let to = self.position(segment.to.node())?;
        Some(from.y.abs_diff(to.y))
    }
}
