//! Network lints.

use std::collections::BTreeSet;

use super::network::CombinatorNode;

/// Suspicious wires of a compiled network. None of these is an error;
/// the simulation simply sees empty signal sets on undriven wires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireReport {
    /// Read by some combinator but written by none
    pub undriven: Vec<String>,
    /// Written by some combinator but read by none
    pub unread: Vec<String>,
}

impl WireReport {
    pub fn is_clean(&self) -> bool {
        self.undriven.is_empty() && self.unread.is_empty()
    }
}

/// Check a network for wires with only one kind of connection.
///
/// Checks:
/// - Every input wire is driven by at least one output
/// - Every output wire is read by at least one input
pub fn check_wires(combinators: &[CombinatorNode]) -> WireReport {
    let mut driven = BTreeSet::new();
    let mut read = BTreeSet::new();
    for node in combinators {
        driven.extend(node.outputs.iter().map(String::as_str));
        read.extend(node.inputs.iter().map(String::as_str));
    }

    let report = WireReport {
        undriven: read.difference(&driven).map(|w| w.to_string()).collect(),
        unread: driven.difference(&read).map(|w| w.to_string()).collect(),
    };
    for wire in &report.undriven {
        log::warn!("wire {} is read but never driven", wire);
    }
    for wire in &report.unread {
        log::debug!("wire {} is driven but never read", wire);
    }
    report
}
