//! Decider combinators.
//!
//! A decider tests a comparison and forwards either the matching input
//! values or 1 ("as one" mode). Deciders with `each` on the left test every
//! input signal on its own; signals that fail are skipped and the rest still
//! contribute.

use serde::Serialize;

use super::operator::Value;
use crate::dsl::Operator;
use crate::signal::SignalSet;

/// The left side of a simple decider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// A single signal or constant
    Value(Value),
    /// True if any present signal passes
    Any,
    /// True if every present signal passes, vacuously on empty input
    All,
}

/// What a simple decider emits when its condition holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeciderOutput {
    Signal(String),
    /// Every input signal
    All,
}

/// `left cmp right then output` where the outcome is a single condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleDecider {
    pub op: Operator,
    pub left: Condition,
    pub right: Value,
    pub output: DeciderOutput,
    pub as_one: bool,
}

impl SimpleDecider {
    fn condition_met(&self, input: &SignalSet) -> bool {
        let right = self.right.resolve(input);
        match &self.left {
            Condition::Value(left) => self.op.compare(left.resolve(input), right),
            Condition::Any => input.iter().any(|(_, v)| self.op.compare(v, right)),
            Condition::All => input.iter().all(|(_, v)| self.op.compare(v, right)),
        }
    }

    pub fn output(&self, input: &SignalSet) -> SignalSet {
        if !self.condition_met(input) {
            return SignalSet::new();
        }
        match &self.output {
            DeciderOutput::All if self.as_one => input.iter().map(|(k, _)| (k, 1)).collect(),
            DeciderOutput::All => input.clone(),
            DeciderOutput::Signal(name) => {
                let value = if self.as_one { 1 } else { input.get(name) };
                let mut r = SignalSet::new();
                r.set(name.as_str(), value as i64);
                r
            }
        }
    }
}

/// `each cmp right then output`: sums the passing signals (or counts them in
/// "as one" mode) into one output signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumDecider {
    pub op: Operator,
    pub right: Value,
    pub output: String,
    pub as_one: bool,
}

impl SumDecider {
    pub fn output(&self, input: &SignalSet) -> SignalSet {
        let right = self.right.resolve(input);
        let sum: i64 = input
            .iter()
            .filter(|&(_, v)| self.op.compare(v, right))
            .map(|(_, v)| if self.as_one { 1 } else { v as i64 })
            .sum();
        let mut r = SignalSet::new();
        r.set(self.output.as_str(), sum);
        r
    }
}

/// `each cmp right then each`: keeps the passing signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterDecider {
    pub op: Operator,
    pub right: Value,
    pub as_one: bool,
}

impl FilterDecider {
    pub fn output(&self, input: &SignalSet) -> SignalSet {
        let right = self.right.resolve(input);
        input
            .iter()
            .filter(|&(_, v)| self.op.compare(v, right))
            .map(|(k, v)| (k, if self.as_one { 1 } else { v as i64 }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> SignalSet {
        [("b", 13), ("a", 4), ("c", 612)].into_iter().collect()
    }

    fn simple(left: Condition, constant: i32, output: DeciderOutput, as_one: bool) -> SimpleDecider {
        SimpleDecider {
            op: Operator::Gt,
            left,
            right: Value::Constant(constant),
            output,
            as_one,
        }
    }

    fn x() -> DeciderOutput {
        DeciderOutput::Signal("x".into())
    }

    #[test]
    fn test_all_condition() {
        assert!(simple(Condition::All, 700, x(), true).output(&input()).is_empty());
        assert!(simple(Condition::All, 10, x(), true).output(&input()).is_empty());
        assert_eq!(simple(Condition::All, 0, x(), true).output(&input()).get("x"), 1);
    }

    #[test]
    fn test_all_condition_vacuous_on_empty_input() {
        let out = simple(Condition::All, 0, x(), true).output(&SignalSet::new());
        assert_eq!(out.get("x"), 1);
    }

    #[test]
    fn test_any_condition() {
        assert_eq!(simple(Condition::Any, 0, x(), true).output(&input()).get("x"), 1);
        assert_eq!(simple(Condition::Any, 10, x(), true).output(&input()).get("x"), 1);
        assert!(simple(Condition::Any, 700, x(), true).output(&input()).is_empty());
        assert!(simple(Condition::Any, 0, x(), true).output(&SignalSet::new()).is_empty());
    }

    #[test]
    fn test_signal_then_all() {
        let a = Condition::Value(Value::Signal("a".into()));
        assert_eq!(simple(a.clone(), 0, DeciderOutput::All, false).output(&input()), input());
        let ones: SignalSet = [("a", 1), ("b", 1), ("c", 1)].into_iter().collect();
        assert_eq!(simple(a, 0, DeciderOutput::All, true).output(&input()), ones);
    }

    #[test]
    fn test_any_then_all_passes_input() {
        assert_eq!(
            simple(Condition::Any, 600, DeciderOutput::All, false).output(&input()),
            input()
        );
    }

    #[test]
    fn test_signal_output_forwards_input_count() {
        let c = simple(
            Condition::Value(Value::Signal("c".into())),
            600,
            DeciderOutput::Signal("b".into()),
            false,
        );
        assert_eq!(c.output(&input()).get("b"), 13);
    }

    #[test]
    fn test_sum_decider_skips_failing_signals() {
        let mut c = SumDecider {
            op: Operator::Gt,
            right: Value::Constant(10),
            output: "x".into(),
            as_one: false,
        };
        assert_eq!(c.output(&input()).get("x"), 625);
        c.as_one = true;
        assert_eq!(c.output(&input()).get("x"), 2);
    }

    #[test]
    fn test_filter_decider_skips_failing_signals() {
        let mut c = FilterDecider {
            op: Operator::Gt,
            right: Value::Constant(10),
            as_one: false,
        };
        let expected: SignalSet = [("b", 13), ("c", 612)].into_iter().collect();
        assert_eq!(c.output(&input()), expected);
        c.as_one = true;
        let expected: SignalSet = [("b", 1), ("c", 1)].into_iter().collect();
        assert_eq!(c.output(&input()), expected);
    }

    #[test]
    fn test_filter_keeps_signals_after_a_failure() {
        // "a" sorts first and fails; later signals must still be tested.
        let c = FilterDecider {
            op: Operator::Ne,
            right: Value::Constant(4),
            as_one: false,
        };
        assert_eq!(c.output(&input()).len(), 2);
    }
}
