//! Operator evaluation and operand resolution.

use std::fmt;

use serde::Serialize;

use crate::dsl::{Operand, Operator};
use crate::signal::{clamp, SignalSet};

impl Operator {
    /// Evaluate an arithmetic operator, saturating the result.
    ///
    /// Division floors toward negative infinity. Division or remainder by
    /// zero yields 0, remainder takes the sign of the dividend and shift
    /// amounts use their low 5 bits. Comparison operators yield 1 or 0.
    pub fn apply(&self, a: i32, b: i32) -> i32 {
        let (a, b) = (a as i64, b as i64);
        let result = match self {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
            Operator::Div => floor_div(a, b),
            Operator::Rem => {
                if b == 0 {
                    0
                } else {
                    a % b
                }
            }
            Operator::And => a & b,
            Operator::Or => a | b,
            Operator::Xor => a ^ b,
            Operator::Shr => a >> (b & 31),
            Operator::Shl => a << (b & 31),
            _ => self.compare(a as i32, b as i32) as i64,
        };
        clamp(result)
    }

    /// Evaluate a comparison operator. Arithmetic operators test the
    /// result for non-zero.
    pub fn compare(&self, a: i32, b: i32) -> bool {
        match self {
            Operator::Lt => a < b,
            Operator::Le => a <= b,
            Operator::Eq => a == b,
            Operator::Ne => a != b,
            Operator::Ge => a >= b,
            Operator::Gt => a > b,
            _ => self.apply(a, b) != 0,
        }
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    if b == 0 {
        return 0;
    }
    let quotient = a / b;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

/// A combinator operand after compilation: a signal read from the input, or a
/// saturated constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Signal(String),
    Constant(i32),
}

impl Value {
    /// Current value of this operand for the given input.
    pub fn resolve(&self, input: &SignalSet) -> i32 {
        match self {
            Value::Signal(name) => input.get(name),
            Value::Constant(value) => *value,
        }
    }
}

impl From<&Operand> for Value {
    fn from(operand: &Operand) -> Self {
        match operand {
            Operand::Signal(name) => Value::Signal(name.clone()),
            Operand::Literal(value) => Value::Constant(clamp(*value)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Signal(name) => write!(f, "{}", name),
            Value::Constant(value) => write!(f, "{}", value),
        }
    }
}
