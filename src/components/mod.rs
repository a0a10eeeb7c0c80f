//! Combinator models for network simulation.
//!
//! This module provides every kind of combinator the language can build:
//! - Constant: Constant, Toggle, Pulse
//! - Arithmetic: value-as-value, each-as-value, each-as-each
//! - Decider: simple (signal/any/all), sum, filter
//! - Passive: Display, Label
//!
//! Each variant computes its output from the merged input of one tick.

mod arithmetic;
mod constant;
mod decider;
mod display;
mod operator;

pub use arithmetic::{EachAsEach, EachAsValue, ValueAsValue};
pub use constant::{Button, Constant};
pub use decider::{Condition, DeciderOutput, FilterDecider, SimpleDecider, SumDecider};
pub use display::{Display, Label};
pub use operator::Value;

use std::fmt;

use serde::Serialize;

use crate::dsl::{ConstantMode, Expr, Operand, SpecialSignal};
use crate::error::{CnideError, Result};
use crate::signal::SignalSet;

/// A network combinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Combinator {
    Constant(Constant),
    Toggle(Button),
    Pulse(Button),
    ValueAsValue(ValueAsValue),
    EachAsValue(EachAsValue),
    EachAsEach(EachAsEach),
    SimpleDecider(SimpleDecider),
    SumDecider(SumDecider),
    FilterDecider(FilterDecider),
    Display(Display),
    Label(Label),
}

impl Combinator {
    /// Create a constant, toggle or pulse combinator.
    pub fn constant(mode: ConstantMode, values: &[(String, i64)]) -> Self {
        let values = values.iter().map(|(k, v)| (k.as_str(), *v));
        match mode {
            ConstantMode::Constant => Combinator::Constant(Constant::new(values)),
            ConstantMode::Toggle => Combinator::Toggle(Button::new(values)),
            ConstantMode::Pulse => Combinator::Pulse(Button::new(values)),
        }
    }

    /// Create an arithmetic or decider combinator from an expression,
    /// selecting the variant from the special signals it uses.
    pub fn from_expr(expr: &Expr) -> Result<Self> {
        let invalid = |message: &str| CnideError::invalid_operand(message, expr.span);

        let left_special = match &expr.left {
            Operand::Signal(name) => SpecialSignal::from_name(name),
            Operand::Literal(_) => None,
        };
        if let Operand::Signal(name) = &expr.right {
            if SpecialSignal::from_name(name).is_some() {
                return Err(invalid(&format!(
                    "'{}' cannot be used as the right operand",
                    name
                )));
            }
        }
        let right = Value::from(&expr.right);
        let output = SpecialSignal::from_name(&expr.output);
        let op = expr.op;

        if !op.is_comparison() {
            return match (left_special, output) {
                (Some(SpecialSignal::Each), Some(SpecialSignal::Each)) => {
                    Ok(Combinator::EachAsEach(EachAsEach { op, right }))
                }
                (Some(SpecialSignal::Each), None) => Ok(Combinator::EachAsValue(EachAsValue {
                    op,
                    right,
                    output: expr.output.clone(),
                })),
                (None, None) => Ok(Combinator::ValueAsValue(ValueAsValue {
                    op,
                    left: Value::from(&expr.left),
                    right,
                    output: expr.output.clone(),
                })),
                (Some(SpecialSignal::Any | SpecialSignal::All), _) => Err(invalid(
                    "arithmetic combinators only accept 'each' as a special input",
                )),
                (_, Some(SpecialSignal::Each)) => {
                    Err(invalid("'each' output requires 'each' as the left operand"))
                }
                (_, Some(_)) => Err(invalid(&format!(
                    "'{}' cannot be the output of an arithmetic combinator",
                    expr.output
                ))),
            };
        }

        let as_one = expr.as_one;
        match (left_special, output) {
            (Some(SpecialSignal::Each), Some(SpecialSignal::Each)) => {
                Ok(Combinator::FilterDecider(FilterDecider { op, right, as_one }))
            }
            (Some(SpecialSignal::Each), None) => Ok(Combinator::SumDecider(SumDecider {
                op,
                right,
                output: expr.output.clone(),
                as_one,
            })),
            (Some(SpecialSignal::Each), Some(_)) => Err(invalid(
                "a decider with 'each' input outputs 'each' or a signal",
            )),
            (_, Some(SpecialSignal::Each)) => {
                Err(invalid("'each' output requires 'each' as the left operand"))
            }
            (_, Some(SpecialSignal::Any)) => Err(invalid(&format!(
                "'{}' cannot be the output of a decider",
                expr.output
            ))),
            (left, output) => {
                let left = match left {
                    Some(SpecialSignal::Any) => Condition::Any,
                    Some(SpecialSignal::All) => Condition::All,
                    _ => Condition::Value(Value::from(&expr.left)),
                };
                let output = match output {
                    Some(_) => DeciderOutput::All,
                    None => DeciderOutput::Signal(expr.output.clone()),
                };
                Ok(Combinator::SimpleDecider(SimpleDecider {
                    op,
                    left,
                    right,
                    output,
                    as_one,
                }))
            }
        }
    }

    /// Compute this tick's output from the merged input, updating any
    /// internal state.
    pub fn output(&mut self, input: &SignalSet) -> SignalSet {
        match self {
            Combinator::Constant(c) => c.output(),
            Combinator::Toggle(b) => b.toggle_output(),
            Combinator::Pulse(b) => b.pulse_output(),
            Combinator::ValueAsValue(c) => c.output(input),
            Combinator::EachAsValue(c) => c.output(input),
            Combinator::EachAsEach(c) => c.output(input),
            Combinator::SimpleDecider(c) => c.output(input),
            Combinator::SumDecider(c) => c.output(input),
            Combinator::FilterDecider(c) => c.output(input),
            Combinator::Display(d) => {
                d.observe(input);
                SignalSet::new()
            }
            Combinator::Label(_) => SignalSet::new(),
        }
    }

    /// Short kind name, e.g. for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Combinator::Constant(_) => "constant",
            Combinator::Toggle(_) => "toggle",
            Combinator::Pulse(_) => "pulse",
            Combinator::ValueAsValue(_) | Combinator::EachAsValue(_) | Combinator::EachAsEach(_) => {
                "arithmetic"
            }
            Combinator::SimpleDecider(_) | Combinator::SumDecider(_) | Combinator::FilterDecider(_) => {
                "decider"
            }
            Combinator::Display(_) => "display",
            Combinator::Label(_) => "label",
        }
    }

    /// The switch of a toggle or pulse button.
    pub fn button_mut(&mut self) -> Option<&mut Button> {
        match self {
            Combinator::Toggle(b) | Combinator::Pulse(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Constant(c) => write!(f, "{}", c.values),
            Combinator::Toggle(b) => write!(f, "toggle {}", b.values),
            Combinator::Pulse(b) => write!(f, "pulse {}", b.values),
            Combinator::ValueAsValue(c) => {
                write!(f, "{} {} {} as {}", c.left, c.op, c.right, c.output)
            }
            Combinator::EachAsValue(c) => write!(f, "each {} {} as {}", c.op, c.right, c.output),
            Combinator::EachAsEach(c) => write!(f, "each {} {} as each", c.op, c.right),
            Combinator::SimpleDecider(c) => {
                match &c.left {
                    Condition::Value(v) => write!(f, "{}", v)?,
                    Condition::Any => write!(f, "any")?,
                    Condition::All => write!(f, "all")?,
                }
                write!(f, " {} {} then ", c.op, c.right)?;
                if c.as_one {
                    write!(f, "1 as ")?;
                }
                match &c.output {
                    DeciderOutput::Signal(s) => write!(f, "{}", s),
                    DeciderOutput::All => write!(f, "all"),
                }
            }
            Combinator::SumDecider(c) => write!(
                f,
                "each {} {} then {}{}",
                c.op,
                c.right,
                if c.as_one { "1 as " } else { "" },
                c.output
            ),
            Combinator::FilterDecider(c) => write!(
                f,
                "each {} {} then {}each",
                c.op,
                c.right,
                if c.as_one { "1 as " } else { "" }
            ),
            Combinator::Display(d) => write!(f, "display {}", d.signal),
            Combinator::Label(l) => write!(f, "{} {}", "#".repeat(l.level as usize), l.text),
        }
    }
}
