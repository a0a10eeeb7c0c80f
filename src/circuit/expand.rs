//! Sub-network expansion.
//!
//! Turns a [`Program`] into the flat statement list of its entry network.
//! Every instantiation clones the template body, substitutes bound formal
//! parameters in wire and signal positions, and qualifies the remaining wires
//! as `Template.n.Name`, where `n` counts instances of that template from 1.
//! The counters live in an `ExpansionContext` created per expansion, so
//! expanding the same program twice yields the same names.

use std::collections::HashMap;

use crate::dsl::{Binding, Expr, NetworkDef, Operand, Program, Span, SpecialSignal, Statement, StatementKind};
use crate::error::{CnideError, Result};

/// Expand the entry network of a program into a flat statement list that
/// contains no instantiations.
pub fn expand(program: &Program, max_depth: usize) -> Result<Vec<Statement>> {
    let entry = program
        .entry()
        .ok_or_else(|| CnideError::syntax("no network definitions", Span::default()))?;
    if entry.name != crate::dsl::ENTRY_NETWORK {
        log::warn!(
            "no '{}' network defined, using '{}' as the entry network",
            crate::dsl::ENTRY_NETWORK,
            entry.name
        );
    }
    let mut ctx = ExpansionContext::new(program, max_depth);
    ctx.expand_body(entry, &Scope::root(), 0)?;
    log::debug!(
        "expanded '{}' into {} statements ({} instances)",
        entry.name,
        ctx.out.len(),
        ctx.counters.values().sum::<usize>()
    );
    Ok(ctx.out)
}

/// A name bound to a formal parameter, resolved in the caller's namespace
/// both as a wire and as a signal.
#[derive(Debug, Clone)]
struct Bound {
    wire: String,
    signal: String,
}

/// Naming rules of one network instance.
#[derive(Debug, Default)]
struct Scope {
    /// `Template.n`, or `None` for the entry network
    prefix: Option<String>,
    bindings: HashMap<String, Bound>,
}

impl Scope {
    fn root() -> Self {
        Self::default()
    }

    fn wire(&self, name: &str) -> String {
        match (self.bindings.get(name), &self.prefix) {
            (Some(bound), _) => bound.wire.clone(),
            (None, Some(prefix)) => format!("{}.{}", prefix, name),
            (None, None) => name.to_string(),
        }
    }

    fn wires(&self, names: &[String]) -> Vec<String> {
        names.iter().map(|n| self.wire(n)).collect()
    }

    /// Signals are global; only bound parameters are substituted. Special
    /// signal keywords are never substituted.
    fn signal(&self, name: &str) -> String {
        if SpecialSignal::from_name(name).is_some() {
            return name.to_string();
        }
        match self.bindings.get(name) {
            Some(bound) => bound.signal.clone(),
            None => name.to_string(),
        }
    }

    fn operand(&self, operand: &Operand) -> Operand {
        match operand {
            Operand::Signal(name) => Operand::Signal(self.signal(name)),
            Operand::Literal(v) => Operand::Literal(*v),
        }
    }
}

/// State threaded through one expansion.
#[derive(Debug)]
pub(crate) struct ExpansionContext<'p> {
    program: &'p Program,
    /// Instances created so far, per template
    counters: HashMap<String, usize>,
    max_depth: usize,
    out: Vec<Statement>,
}

impl<'p> ExpansionContext<'p> {
    /// Create a context with fresh instance counters.
    fn new(program: &'p Program, max_depth: usize) -> Self {
        Self {
            program,
            counters: HashMap::new(),
            max_depth,
            out: Vec::new(),
        }
    }

    fn expand_body(&mut self, def: &'p NetworkDef, scope: &Scope, depth: usize) -> Result<()> {
        for stmt in &def.body {
            let kind = match &stmt.kind {
                StatementKind::Constant {
                    mode,
                    values,
                    outputs,
                } => StatementKind::Constant {
                    mode: *mode,
                    values: values.iter().map(|(k, v)| (scope.signal(k), *v)).collect(),
                    outputs: scope.wires(outputs),
                },
                StatementKind::Binary {
                    inputs,
                    expr,
                    outputs,
                } => StatementKind::Binary {
                    inputs: scope.wires(inputs),
                    expr: Expr {
                        left: scope.operand(&expr.left),
                        op: expr.op,
                        right: scope.operand(&expr.right),
                        output: scope.signal(&expr.output),
                        as_one: expr.as_one,
                        span: expr.span,
                    },
                    outputs: scope.wires(outputs),
                },
                StatementKind::Display { inputs, signal } => StatementKind::Display {
                    inputs: scope.wires(inputs),
                    signal: scope.signal(signal),
                },
                StatementKind::ForceColor { color, wires } => StatementKind::ForceColor {
                    color: *color,
                    wires: scope.wires(wires),
                },
                StatementKind::Label { text, level } => StatementKind::Label {
                    text: text.clone(),
                    level: *level,
                },
                StatementKind::Instantiate { name, bindings } => {
                    self.instantiate(name, bindings, stmt.span, scope, depth)?;
                    continue;
                }
            };
            self.out.push(Statement {
                kind,
                span: stmt.span,
            });
        }
        Ok(())
    }

    fn instantiate(
        &mut self,
        name: &str,
        bindings: &[Binding],
        span: Span,
        caller: &Scope,
        depth: usize,
    ) -> Result<()> {
        let program = self.program;
        let def = program.find(name).ok_or_else(|| CnideError::UnknownNetwork {
            name: name.to_string(),
            location: span,
        })?;
        if depth >= self.max_depth {
            return Err(CnideError::RecursionLimit {
                name: name.to_string(),
                depth: self.max_depth,
                location: span,
            });
        }

        let mut bound = HashMap::new();
        for binding in bindings {
            if !def.params.contains(&binding.formal) {
                return Err(CnideError::UnknownParameter {
                    network: name.to_string(),
                    parameter: binding.formal.clone(),
                    location: binding.span,
                });
            }
            let resolved = Bound {
                wire: caller.wire(&binding.actual),
                signal: caller.signal(&binding.actual),
            };
            if bound.insert(binding.formal.clone(), resolved).is_some() {
                return Err(CnideError::DuplicateBinding {
                    network: name.to_string(),
                    parameter: binding.formal.clone(),
                    location: binding.span,
                });
            }
        }

        let counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        let prefix = format!("{}.{}", name, counter);
        log::trace!("instantiating {} at depth {}", prefix, depth + 1);

        let scope = Scope {
            prefix: Some(prefix),
            bindings: bound,
        };
        self.expand_body(def, &scope, depth + 1)
    }
}
