//! Output-free combinators: value displays and labels.

use serde::Serialize;

use crate::signal::{humanize, SignalSet};

/// Shows the value of one input signal. Never emits signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Display {
    pub signal: String,
    /// Value seen on the most recent tick
    pub value: i32,
}

impl Display {
    pub fn new(signal: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            value: 0,
        }
    }

    /// Record the input value.
    pub fn observe(&mut self, input: &SignalSet) {
        self.value = input.get(&self.signal);
    }

    /// The value in compact form, e.g. `12K`.
    pub fn readout(&self) -> String {
        humanize(self.value)
    }
}

/// A heading placed in the grid between combinators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub text: String,
    /// 1 to 3
    pub level: u8,
}

impl Label {
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level: level.clamp(1, 3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_observes_signal() {
        let mut d = Display::new("x");
        let input: SignalSet = [("x", 12_345), ("y", 1)].into_iter().collect();
        d.observe(&input);
        assert_eq!(d.value, 12_345);
        assert_eq!(d.readout(), "12K");
        d.observe(&SignalSet::new());
        assert_eq!(d.value, 0);
    }

    #[test]
    fn test_label_level_is_capped() {
        assert_eq!(Label::new("t", 7).level, 3);
        assert_eq!(Label::new("t", 0).level, 1);
    }
}
