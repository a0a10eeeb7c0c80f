//! The flat combinator network and its tick simulation.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{CombinatorId, Side};
use crate::components::{Combinator, Display, Label};
use crate::dsl::{Span, Statement, StatementKind};
use crate::error::{CnideError, Result};
use crate::layout::{Layout, LayoutConfig, Segmenter};
use crate::signal::{SignalSet, State};
use crate::solver::{Color, WireColorSolver};

/// A combinator placed in a network together with its wiring.
#[derive(Debug, Clone, Serialize)]
pub struct CombinatorNode {
    pub id: CombinatorId,
    pub combinator: Combinator,
    /// At most two wires, one per color
    pub inputs: Vec<String>,
    /// At most two wires, one per color
    pub outputs: Vec<String>,
    /// Statement the combinator was compiled from
    #[serde(skip)]
    pub span: Span,
    last_output: SignalSet,
}

impl CombinatorNode {
    /// Output produced on the most recent tick.
    pub fn last_output(&self) -> &SignalSet {
        &self.last_output
    }

    /// Connection points in order: inputs first, then outputs.
    pub fn connections(&self) -> impl Iterator<Item = (&str, Side)> {
        self.inputs
            .iter()
            .map(|w| (w.as_str(), Side::Input))
            .chain(self.outputs.iter().map(|w| (w.as_str(), Side::Output)))
    }
}

/// Serializable view of the simulation state.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot<'a> {
    pub tick: u64,
    pub state: &'a State,
    /// Display readings keyed by combinator index
    pub displays: BTreeMap<usize, DisplayReading>,
}

/// What a display combinator shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayReading {
    pub signal: String,
    pub value: i32,
    /// Compact form of `value`, e.g. `12K`
    pub readout: String,
}

/// A compiled network of combinators.
///
/// Created by the compiler, advanced with [`step`](Self::step) and laid out
/// once with [`finalize`](Self::finalize).
#[derive(Debug, Clone)]
pub struct CircuitNetwork {
    combinators: Vec<CombinatorNode>,
    state: State,
    tick: u64,
    solver: WireColorSolver,
    layout_config: LayoutConfig,
    layout: Option<Layout>,
}

impl Default for CircuitNetwork {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl CircuitNetwork {
    /// Create an empty network.
    pub fn new(layout_config: LayoutConfig) -> Self {
        Self {
            combinators: Vec::new(),
            state: State::new(),
            tick: 0,
            solver: WireColorSolver::new(),
            layout_config,
            layout: None,
        }
    }

    /// Build a network from expanded statements.
    pub fn from_statements(statements: &[Statement], layout_config: LayoutConfig) -> Result<Self> {
        let mut network = Self::new(layout_config);
        for stmt in statements {
            network.add_statement(stmt)?;
        }
        log::debug!(
            "built network with {} combinators and {} wires",
            network.combinators.len(),
            network.solver.colors().len()
        );
        Ok(network)
    }

    fn add_statement(&mut self, stmt: &Statement) -> Result<()> {
        match &stmt.kind {
            StatementKind::Constant {
                mode,
                values,
                outputs,
            } => {
                self.add(Combinator::constant(*mode, values), vec![], outputs.clone(), stmt.span)?;
            }
            StatementKind::Binary {
                inputs,
                expr,
                outputs,
            } => {
                let combinator = Combinator::from_expr(expr)?;
                self.add(combinator, inputs.clone(), outputs.clone(), stmt.span)?;
            }
            StatementKind::Display { inputs, signal } => {
                let display = Combinator::Display(Display::new(signal.as_str()));
                self.add(display, inputs.clone(), vec![], stmt.span)?;
            }
            StatementKind::Label { text, level } => {
                let label = Combinator::Label(Label::new(text.as_str(), *level));
                self.add(label, vec![], vec![], stmt.span)?;
            }
            StatementKind::ForceColor { color, wires } => {
                for wire in wires {
                    self.force_color(wire, *color, stmt.span)?;
                }
            }
            StatementKind::Instantiate { name, .. } => {
                return Err(CnideError::syntax(
                    format!("instantiation of '{}' was not expanded", name),
                    stmt.span,
                ));
            }
        }
        Ok(())
    }

    /// Append a combinator. Its wires are fed to the color solver right away
    /// so that a conflict points at this combinator's source. A rejected
    /// combinator leaves the network unchanged.
    pub fn add(
        &mut self,
        combinator: Combinator,
        inputs: Vec<String>,
        outputs: Vec<String>,
        span: Span,
    ) -> Result<CombinatorId> {
        self.solver
            .add_all(&[inputs.as_slice(), outputs.as_slice()])
            .map_err(|e| e.at(span))?;
        let id = CombinatorId(self.combinators.len());
        self.combinators.push(CombinatorNode {
            id,
            combinator,
            inputs,
            outputs,
            span,
            last_output: SignalSet::new(),
        });
        self.layout = None;
        Ok(id)
    }

    /// Pin a wire to a color.
    pub fn force_color(&mut self, wire: &str, color: Color, span: Span) -> Result<()> {
        self.solver.force_color(wire, color).map_err(|e| e.at(span))?;
        self.layout = None;
        Ok(())
    }

    /// Run the simulation one tick forward.
    ///
    /// Every combinator reads the previous state; outputs are summed into a
    /// fresh state that replaces the old one once all combinators have run.
    pub fn step(&mut self) {
        let mut next = State::new();
        for node in self.combinators.iter_mut() {
            let mut input = SignalSet::new();
            for wire in &node.inputs {
                if let Some(signals) = self.state.get(wire) {
                    input.merge(signals);
                }
            }
            let output = node.combinator.output(&input);
            for wire in &node.outputs {
                next.entry(wire.clone()).or_default().merge(&output);
            }
            node.last_output = output;
        }
        self.state = next;
        self.tick += 1;
        log::trace!("tick {}: {} wires carry signals", self.tick, self.state.len());
    }

    /// Run `ticks` ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Signals on every wire after the most recent tick.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Signals on one wire, empty if the wire carries nothing.
    pub fn wire(&self, name: &str) -> SignalSet {
        self.state.get(name).cloned().unwrap_or_default()
    }

    /// Number of ticks run.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn combinators(&self) -> &[CombinatorNode] {
        &self.combinators
    }

    pub fn get(&self, index: usize) -> Option<&CombinatorNode> {
        self.combinators.get(index)
    }

    /// Switch a toggle or pulse button on or off.
    pub fn set_active(&mut self, index: usize, active: bool) -> Result<()> {
        let node = self
            .combinators
            .get_mut(index)
            .ok_or(CnideError::CombinatorNotFound { index })?;
        let button = node
            .combinator
            .button_mut()
            .ok_or(CnideError::NotControllable { index })?;
        button.active = active;
        Ok(())
    }

    /// Flip a toggle or pulse button, returning its new state.
    pub fn toggle_active(&mut self, index: usize) -> Result<bool> {
        let active = match self.combinators.get_mut(index) {
            Some(node) => match node.combinator.button_mut() {
                Some(button) => !button.active,
                None => return Err(CnideError::NotControllable { index }),
            },
            None => return Err(CnideError::CombinatorNotFound { index }),
        };
        self.set_active(index, active)?;
        Ok(active)
    }

    /// Value shown by a display combinator.
    pub fn display_value(&self, index: usize) -> Option<i32> {
        match &self.combinators.get(index)?.combinator {
            Combinator::Display(d) => Some(d.value),
            _ => None,
        }
    }

    /// Compact text shown by a display combinator.
    pub fn display_readout(&self, index: usize) -> Option<String> {
        match &self.combinators.get(index)?.combinator {
            Combinator::Display(d) => Some(d.readout()),
            _ => None,
        }
    }

    /// A serializable view of the current tick.
    pub fn snapshot(&self) -> StateSnapshot<'_> {
        let displays = self
            .combinators
            .iter()
            .filter_map(|node| match &node.combinator {
                Combinator::Display(d) => Some((
                    node.id.0,
                    DisplayReading {
                        signal: d.signal.clone(),
                        value: d.value,
                        readout: d.readout(),
                    },
                )),
                _ => None,
            })
            .collect();
        StateSnapshot {
            tick: self.tick,
            state: &self.state,
            displays,
        }
    }

    /// Wire colors as currently constrained.
    pub fn colors(&self) -> BTreeMap<String, Color> {
        self.solver.colors()
    }

    /// Compute colors and layout. The result is cached until the network
    /// changes, so repeated calls return the same layout.
    pub fn finalize(&mut self) -> Result<&Layout> {
        let layout = match self.layout.take() {
            Some(layout) => layout,
            None => Segmenter::new(self.layout_config.clone()).layout(self, &self.colors())?,
        };
        Ok(&*self.layout.insert(layout))
    }

    /// The layout computed by the last [`finalize`](Self::finalize).
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    fn signals(pairs: &[(&str, i64)]) -> SignalSet {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    fn simulate(source: &str, ticks: u64) -> CircuitNetwork {
        let mut network = compile(source).unwrap();
        network.run(ticks);
        network
    }

    fn assert_state(network: &CircuitNetwork, expected: &[(&str, &[(&str, i64)])]) {
        let expected: State = expected
            .iter()
            .map(|(wire, pairs)| (wire.to_string(), signals(pairs)))
            .collect();
        assert_eq!(network.state(), &expected);
    }

    fn single_combinator(expr: &str) -> CircuitNetwork {
        simulate(
            &format!("Main(){{ {{b:13,a:4,c:612}} -> IN IN -> {} -> OUT }}", expr),
            2,
        )
    }

    fn assert_single(expr: &str, out: &[(&str, i64)]) {
        let network = single_combinator(expr);
        assert_state(&network, &[("IN", &[("a", 4), ("b", 13), ("c", 612)]), ("OUT", out)]);
    }

    #[test]
    fn test_noop() {
        let network = simulate("Main(){}", 1);
        assert!(network.state().is_empty());
        assert_eq!(network.tick(), 1);
    }

    #[test]
    fn test_constant() {
        assert_state(&simulate("Main(){ {signal: 1} -> WIRE }", 1), &[("WIRE", &[("signal", 1)])]);
    }

    #[test]
    fn test_value_arithmetic() {
        assert_single("a + b as x", &[("x", 17)]);
        assert_single("a * b as x", &[("x", 52)]);
    }

    #[test]
    fn test_each_special_signal() {
        assert_single("each + 10 as each", &[("a", 14), ("b", 23), ("c", 622)]);
        assert_single("each + 10 as x", &[("x", 659)]);
        assert_single("each > 10 then each", &[("b", 13), ("c", 612)]);
        assert_single("each > 10 then 1 as each", &[("b", 1), ("c", 1)]);
        assert_single("each > 10 then x", &[("x", 625)]);
        assert_single("each > 10 then 1 as x", &[("x", 2)]);
    }

    #[test]
    fn test_all_special_signal() {
        assert_single("all > 0 then 1 as x", &[("x", 1)]);
        assert_single("all > 10 then 1 as x", &[]);
        assert_single("all > 700 then 1 as x", &[]);
        assert_single("a > 0 then all", &[("a", 4), ("b", 13), ("c", 612)]);
        assert_single("a > 0 then 1 as all", &[("a", 1), ("b", 1), ("c", 1)]);
        assert_single("everything > 0 then everything", &[("a", 4), ("b", 13), ("c", 612)]);
    }

    #[test]
    fn test_any_special_signal() {
        assert_single("any > 0 then 1 as x", &[("x", 1)]);
        assert_single("any > 10 then 1 as x", &[("x", 1)]);
        assert_single("any > 700 then 1 as x", &[]);
        assert_single("anything > 600 then everything", &[("a", 4), ("b", 13), ("c", 612)]);
    }

    #[test]
    fn test_output_overflow_and_underflow() {
        assert_state(
            &simulate("Main(){ {signal: 9999999999999} -> WIRE }", 1),
            &[("WIRE", &[("signal", 2147483647)])],
        );
        assert_state(
            &simulate("Main(){ {signal: -9999999999999} -> WIRE }", 1),
            &[("WIRE", &[("signal", -2147483647)])],
        );
    }

    #[test]
    fn test_input_overflow() {
        let network = simulate(
            "Main(){ {signal: 2000000000} -> (A, B) (A, B) -> signal / 2 as signal -> OUT }",
            2,
        );
        assert_state(
            &network,
            &[
                ("A", &[("signal", 2000000000)]),
                ("B", &[("signal", 2000000000)]),
                ("OUT", &[("signal", 1073741823)]),
            ],
        );
    }

    #[test]
    fn test_subnetwork_binds_wires() {
        let network = simulate(
            "Main() {
              {a:42} -> ALPHA
              Sub(IN=ALPHA, OUT=OMEGA)
            }
            Sub(IN, OUT) {
              IN -> a / 2 as b -> OUT
            }",
            2,
        );
        assert_state(&network, &[("ALPHA", &[("a", 42)]), ("OMEGA", &[("b", 21)])]);
    }

    #[test]
    fn test_subnetwork_internal_wires() {
        let network = simulate(
            "Main() {
              {a:42} -> ALPHA
              Sub(IN=ALPHA, OUT=OMEGA)
            }
            Sub(IN, OUT) {
              IN -> a / 2 as b -> INTERNAL
              INTERNAL -> b * 4 as c -> OUT
            }",
            3,
        );
        assert_state(
            &network,
            &[
                ("ALPHA", &[("a", 42)]),
                ("OMEGA", &[("c", 84)]),
                ("Sub.1.INTERNAL", &[("b", 21)]),
            ],
        );
    }

    #[test]
    fn test_subnetwork_one_wire() {
        let network = simulate(
            "Main() {
              {a:42} -> ALPHA
              Sub(PARAM=ALPHA)
            }
            Sub(PARAM) {
              PARAM -> a / 2 as b -> PARAM
            }",
            2,
        );
        assert_state(&network, &[("ALPHA", &[("a", 42), ("b", 21)])]);
    }

    #[test]
    fn test_subnetwork_substitutes_signals() {
        let network = simulate(
            "Main() {
              {a:42} -> ALPHA
              Sub(IN=ALPHA, OUT=OMEGA, input_signal=a, output_signal=b)
            }
            Sub(IN, OUT, input_signal, output_signal) {
              IN -> input_signal / 2 as output_signal -> OUT
            }",
            2,
        );
        assert_state(&network, &[("ALPHA", &[("a", 42)]), ("OMEGA", &[("b", 21)])]);

        let network = simulate("Main() { Sub(OUT=OMEGA, param=x) } Sub(OUT, param) { {param: 42} -> OUT }", 1);
        assert_state(&network, &[("OMEGA", &[("x", 42)])]);
    }

    #[test]
    fn test_tick_is_lock_step() {
        let mut network = compile("Main() { {a: 1} -> A  A -> a + 1 as a -> B  B -> a * 10 as a -> C }").unwrap();
        network.step();
        assert_eq!(network.wire("B"), signals(&[("a", 1)]));
        assert!(network.wire("C").is_empty());
        network.step();
        assert_eq!(network.wire("B").get("a"), 2);
        assert_eq!(network.wire("C").get("a"), 10);
        network.step();
        assert_eq!(network.wire("C").get("a"), 20);
    }

    #[test]
    fn test_feedback_counter() {
        let mut network = compile("Main() { {x: 1} -> C  C -> x + 0 as x -> C }").unwrap();
        network.run(5);
        assert_eq!(network.wire("C").get("x"), 5);
    }

    #[test]
    fn test_toggle_and_pulse_buttons() {
        let mut network = compile("Main() { toggle {t: 1} -> T  pulse {p: 1} -> P  {c: 1} -> K }").unwrap();
        network.step();
        assert!(network.wire("T").is_empty());
        network.set_active(0, true).unwrap();
        network.set_active(1, true).unwrap();
        network.step();
        assert_eq!(network.wire("T").get("t"), 1);
        assert_eq!(network.wire("P").get("p"), 1);
        network.step();
        assert_eq!(network.wire("T").get("t"), 1);
        assert!(network.wire("P").is_empty());
        assert!(!network.toggle_active(0).unwrap());
        network.step();
        assert!(network.wire("T").is_empty());

        assert!(matches!(network.set_active(2, true), Err(CnideError::NotControllable { index: 2 })));
        assert!(matches!(network.toggle_active(9), Err(CnideError::CombinatorNotFound { index: 9 })));
    }

    #[test]
    fn test_display_and_last_output() {
        let mut network = compile("Main() { {x: 1500} -> A  A -> x * 2 as y -> B  B -> display y }").unwrap();
        network.run(2);
        assert_eq!(network.display_value(2), Some(0));
        network.step();
        assert_eq!(network.display_value(2), Some(3000));
        assert_eq!(network.display_value(0), None);
        assert_eq!(network.get(1).unwrap().last_output().get("y"), 3000);
        assert!(network.get(2).unwrap().last_output().is_empty());
        assert_eq!(network.display_readout(2).as_deref(), Some("3K"));
        assert_eq!(network.display_readout(1), None);
        let snapshot = network.snapshot();
        let reading = &snapshot.displays[&2];
        assert_eq!((reading.signal.as_str(), reading.value), ("y", 3000));
        assert_eq!(reading.readout, "3K");
    }

    #[test]
    fn test_color_conflict_is_a_compile_error() {
        let err = compile("Main() {\n(A, B) -> x + 0 as x -> (B, C)\n{x: 1} -> (A, C)\n}").unwrap_err();
        match &err {
            CnideError::ColorConflict {
                first,
                second,
                location,
            } => {
                assert_eq!((first.as_str(), second.as_str()), ("A", "C"));
                assert_eq!(location.unwrap().start.line, 3);
            }
            other => panic!("expected color conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_combinator_leaves_network_unchanged() {
        let mut network = CircuitNetwork::default();
        let label = || Combinator::Label(Label::new("x", 1));
        network
            .add(label(), vec!["A".into(), "B".into()], vec![], Span::default())
            .unwrap();
        let err = network
            .add(
                label(),
                vec!["C".into(), "A".into()],
                vec!["C".into(), "B".into()],
                Span::default(),
            )
            .unwrap_err();
        assert!(matches!(err, CnideError::ColorConflict { location: Some(_), .. }));
        assert_eq!(network.combinators().len(), 1);
        assert!(!network.colors().contains_key("C"));
        network
            .add(label(), vec!["C".into(), "B".into()], vec![], Span::default())
            .unwrap();
        assert_eq!(network.colors()["C"], Color::Red);
    }

    #[test]
    fn test_forced_colors() {
        let mut network = compile("Main() { {x: 1} -> (A, B)  green A }").unwrap();
        let layout = network.finalize().unwrap();
        assert_eq!(layout.colors["A"], Color::Green);
        assert_eq!(layout.colors["B"], Color::Red);
        assert!(compile("Main() { {x: 1} -> (A, B)  red (A, B) }").is_err());
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut network = compile("Main() { {a: 1} -> (A, B)  (A, B) -> a + 1 as a -> C  C -> display a }").unwrap();
        let first = network.finalize().unwrap().clone();
        let second = network.finalize().unwrap().clone();
        assert_eq!(first, second);
        network.step();
        assert_eq!(network.finalize().unwrap(), &first);
    }

    #[test]
    fn test_labels_take_grid_cells() {
        let mut network = compile("Main() { # Title\n {a: 1} -> A  A -> display a }").unwrap();
        assert_eq!(network.combinators()[0].combinator.kind(), "label");
        let layout = network.finalize().unwrap();
        assert_eq!(layout.slots.len(), 3);
        network.step();
        assert!(network.get(0).unwrap().last_output().is_empty());
    }

    #[test]
    fn test_too_many_wires() {
        let err = compile("Main() { {a: 1} -> (A, B, C) }").unwrap_err();
        assert!(matches!(err, CnideError::TooManyWires { count: 3, location: Some(_) }));
    }
}
