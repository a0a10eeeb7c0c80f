//! Arithmetic combinators.

use serde::Serialize;

use super::operator::Value;
use crate::dsl::Operator;
use crate::signal::SignalSet;

/// `left op right as output` with plain signals or constants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueAsValue {
    pub op: Operator,
    pub left: Value,
    pub right: Value,
    pub output: String,
}

impl ValueAsValue {
    pub fn output(&self, input: &SignalSet) -> SignalSet {
        let mut r = SignalSet::new();
        let value = self.op.apply(self.left.resolve(input), self.right.resolve(input));
        r.set(self.output.as_str(), value as i64);
        r
    }
}

/// `each op right as output`: the sum of the operation over every input
/// signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EachAsValue {
    pub op: Operator,
    pub right: Value,
    pub output: String,
}

impl EachAsValue {
    pub fn output(&self, input: &SignalSet) -> SignalSet {
        let right = self.right.resolve(input);
        let sum: i64 = input
            .iter()
            .map(|(_, value)| self.op.apply(value, right) as i64)
            .sum();
        let mut r = SignalSet::new();
        r.set(self.output.as_str(), sum);
        r
    }
}

/// `each op right as each`: the operation applied to every input signal
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EachAsEach {
    pub op: Operator,
    pub right: Value,
}

impl EachAsEach {
    pub fn output(&self, input: &SignalSet) -> SignalSet {
        let right = self.right.resolve(input);
        input
            .iter()
            .map(|(name, value)| (name, self.op.apply(value, right) as i64))
            .collect()
    }
}
