//! Constant combinators and the externally switched buttons built on them.

use serde::Serialize;

use crate::signal::SignalSet;

/// A combinator which always outputs the same signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constant {
    pub values: SignalSet,
}

impl Constant {
    /// Create a constant combinator. Values are saturated and zero entries
    /// dropped.
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = (S, i64)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn output(&self) -> SignalSet {
        self.values.clone()
    }
}

/// A constant combinator that only emits while switched on.
///
/// Used for both toggle buttons, which stay on until switched off, and pulse
/// buttons, which switch themselves off after one active tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub values: SignalSet,
    pub active: bool,
}

impl Button {
    /// Create an inactive button.
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = (S, i64)>) -> Self {
        Self {
            values: values.into_iter().collect(),
            active: false,
        }
    }

    /// Output while held on.
    pub fn toggle_output(&self) -> SignalSet {
        if self.active {
            self.values.clone()
        } else {
            SignalSet::new()
        }
    }

    /// Output once, then release.
    pub fn pulse_output(&mut self) -> SignalSet {
        let output = self.toggle_output();
        self.active = false;
        output
    }
}
