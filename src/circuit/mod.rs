//! Flat combinator networks.
//!
//! This module turns a parsed [`Program`](crate::dsl::Program) into a
//! [`CircuitNetwork`]: sub-networks are expanded into a flat statement list,
//! every statement becomes a combinator, and wires are fed to the color
//! solver as they appear. The network then runs tick by tick.

mod expand;
mod network;
mod types;
mod validate;

pub use expand::expand;
pub use network::{CircuitNetwork, CombinatorNode, DisplayReading, StateSnapshot};
pub use types::*;
pub use validate::{check_wires, WireReport};
