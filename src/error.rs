//! Error types for the cnide compiler, simulator and layout engine.
//!
//! This module provides a unified error type [`CnideError`] that covers
//! every failure of parsing, sub-network expansion, wire coloring and layout.
//! Errors that originate in source text carry a [`Span`] so a caller can
//! highlight the offending range.

use thiserror::Error;

use crate::dsl::Span;

/// Result type alias using [`CnideError`].
pub type Result<T> = std::result::Result<T, CnideError>;

/// Unified error type for all cnide operations.
#[derive(Error, Debug)]
pub enum CnideError {
    // ============ Compile Errors ============
    /// Lexical or grammatical error in the source text
    #[error("Syntax error at {location}: {message}")]
    Syntax { message: String, location: Span },

    /// Two wires must be both the same color and opposite colors
    #[error(
        "Wires {first} and {second} must be the same color and cannot be added to the same side of a combinator"
    )]
    ColorConflict {
        first: String,
        second: String,
        location: Option<Span>,
    },

    /// A combinator side carries more wires than the two color channels allow
    #[error("A combinator side can carry at most 2 wires, got {count}")]
    TooManyWires { count: usize, location: Option<Span> },

    /// Instantiation of a network that was never defined
    #[error("Unknown network '{name}' at {location}")]
    UnknownNetwork { name: String, location: Span },

    /// Binding a parameter the network does not declare
    #[error("Network '{network}' has no parameter '{parameter}' (at {location})")]
    UnknownParameter {
        network: String,
        parameter: String,
        location: Span,
    },

    /// The same parameter bound twice in one instantiation
    #[error("Parameter '{parameter}' of '{network}' is bound more than once (at {location})")]
    DuplicateBinding {
        network: String,
        parameter: String,
        location: Span,
    },

    /// Two definitions share a name
    #[error("Network '{name}' is defined more than once (at {location})")]
    DuplicateNetwork { name: String, location: Span },

    /// Sub-network instantiation nested deeper than the configured limit
    #[error("Instantiating '{name}' exceeds the maximum nesting depth of {depth} (at {location})")]
    RecursionLimit {
        name: String,
        depth: usize,
        location: Span,
    },

    /// Special signal or operator used where the combinator cannot accept it
    #[error("Invalid operand at {location}: {message}")]
    InvalidOperand { message: String, location: Span },

    // ============ Layout Errors ============
    /// Relay insertion failed
    #[error(transparent)]
    Layout(#[from] LayoutError),

    // ============ Runtime Control Errors ============
    /// No combinator with this index
    #[error("No combinator with index {index}")]
    CombinatorNotFound { index: usize },

    /// Attempt to activate a combinator that is not a toggle or pulse button
    #[error("Combinator {index} is not a toggle or pulse button")]
    NotControllable { index: usize },

    // ============ I/O Errors ============
    /// Error reading a source file
    #[error("Failed to read source file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error encoding a snapshot
    #[cfg(feature = "serde_json")]
    #[error("Failed to encode snapshot: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the layout/segmenting pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Pole insertion did not settle within the iteration bound
    #[error("Network too complex to lay out: relays did not converge after {iterations} iterations at slot {slot}")]
    TooComplex { iterations: usize, slot: usize },

    /// A wire appeared in the layout without a resolved color
    #[error("Wire '{wire}' has no color")]
    Uncolored { wire: String },
}

impl CnideError {
    /// Create a syntax error
    pub fn syntax(message: impl Into<String>, location: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            location,
        }
    }

    /// Create an invalid operand error
    pub fn invalid_operand(message: impl Into<String>, location: Span) -> Self {
        Self::InvalidOperand {
            message: message.into(),
            location,
        }
    }

    /// Create a color conflict error with no source context yet
    pub fn color_conflict(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::ColorConflict {
            first: first.into(),
            second: second.into(),
            location: None,
        }
    }

    /// Attach a source span to errors raised below the compiler.
    ///
    /// Errors that already carry a location are returned unchanged.
    pub fn at(self, span: Span) -> Self {
        match self {
            Self::ColorConflict {
                first,
                second,
                location: None,
            } => Self::ColorConflict {
                first,
                second,
                location: Some(span),
            },
            Self::TooManyWires {
                count,
                location: None,
            } => Self::TooManyWires {
                count,
                location: Some(span),
            },
            other => other,
        }
    }

    /// The source range this error refers to, if any.
    pub fn location(&self) -> Option<Span> {
        match self {
            Self::Syntax { location, .. }
            | Self::UnknownNetwork { location, .. }
            | Self::UnknownParameter { location, .. }
            | Self::DuplicateBinding { location, .. }
            | Self::DuplicateNetwork { location, .. }
            | Self::RecursionLimit { location, .. }
            | Self::InvalidOperand { location, .. } => Some(*location),
            Self::ColorConflict { location, .. } | Self::TooManyWires { location, .. } => *location,
            _ => None,
        }
    }
}
