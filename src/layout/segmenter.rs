//! Placement and relay insertion.
//!
//! A single forward pass over the position stream. Poles are scheduled into
//! fixed future slots; combinators take the remaining slots in declaration
//! order. Before each slot is filled, every open wire end (the last placed
//! connection of a wire that has more connections) is checked against its
//! reach, the last slot whose row is still within the clique window. If the
//! end's next connection can no longer land within reach, the wire is relayed
//! through a recent pole with room for it, or through a new pole scheduled at
//! the latest free slot in reach.

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::{
    Endpoint, Layout, LayoutConfig, NodeRef, Pole, WireSegment, POLE_CAPACITY,
    POLE_COLOR_CAPACITY,
};
use crate::circuit::{CircuitNetwork, CombinatorId, GridPosition, Side};
use crate::error::{LayoutError, Result};
use crate::solver::Color;

/// Computes a [`Layout`] for a network.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: LayoutConfig,
}

/// The last placed connection of a wire that still has connections ahead.
#[derive(Debug, Clone, Copy)]
struct OpenEnd {
    endpoint: Endpoint,
    slot: usize,
}

impl Segmenter {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Lay out a network whose wires have been colored.
    pub fn layout(&self, network: &CircuitNetwork, colors: &BTreeMap<String, Color>) -> Result<Layout> {
        let connections: Vec<Vec<(String, Side)>> = network
            .combinators()
            .iter()
            .map(|node| node.connections().map(|(w, s)| (w.to_string(), s)).collect())
            .collect();
        let layout = Placement::new(&self.config, &connections, colors).run()?;
        log::debug!(
            "laid out {} combinators with {} poles and {} segments",
            connections.len(),
            layout.poles.len(),
            layout.segments().len()
        );
        Ok(layout)
    }
}

/// Working state of one layout pass.
struct Placement<'a> {
    width: usize,
    window: usize,
    connections: &'a [Vec<(String, Side)>],
    colors: &'a BTreeMap<String, Color>,
    /// Connection points not yet placed, per wire
    queues: HashMap<String, VecDeque<Endpoint>>,
    open: BTreeMap<String, OpenEnd>,
    /// Slot to pole index, for poles not yet reached
    scheduled: BTreeMap<usize, usize>,
    recent: VecDeque<usize>,
    poles: Vec<Pole>,
    slots: Vec<NodeRef>,
    positions: Vec<GridPosition>,
    segments: Vec<WireSegment>,
    next_combinator: usize,
}

impl<'a> Placement<'a> {
    fn new(
        config: &LayoutConfig,
        connections: &'a [Vec<(String, Side)>],
        colors: &'a BTreeMap<String, Color>,
    ) -> Self {
        let mut queues: HashMap<String, VecDeque<Endpoint>> = HashMap::new();
        for (id, conns) in connections.iter().enumerate() {
            for (wire, side) in conns {
                queues.entry(wire.clone()).or_default().push_back(Endpoint::Combinator {
                    id: CombinatorId(id),
                    side: *side,
                });
            }
        }
        Self {
            width: config.clique_size.max(2),
            window: config.recent_pole_window.max(1),
            connections,
            colors,
            queues,
            open: BTreeMap::new(),
            scheduled: BTreeMap::new(),
            recent: VecDeque::new(),
            poles: Vec::new(),
            slots: Vec::new(),
            positions: vec![GridPosition::default(); connections.len()],
            segments: Vec::new(),
            next_combinator: 0,
        }
    }

    fn run(mut self) -> std::result::Result<Layout, LayoutError> {
        let max_pole_run = self.width * self.width * self.width;
        let mut pole_run = 0;
        let mut slot = 0;
        while self.next_combinator < self.connections.len() {
            self.expire_recent(slot);
            self.relay_endangered(slot)?;
            match self.scheduled.remove(&slot) {
                Some(pole) => {
                    self.place_pole(pole, slot)?;
                    pole_run += 1;
                }
                None => {
                    self.place_combinator(slot)?;
                    pole_run = 0;
                }
            }
            // Open wires that fill whole reach windows with relays keep
            // pushing the next combinator back.
            if pole_run > max_pole_run {
                log::debug!(
                    "slot {}: {} consecutive poles, {} wires still open",
                    slot,
                    pole_run,
                    self.open.len()
                );
                return Err(LayoutError::TooComplex {
                    iterations: pole_run,
                    slot,
                });
            }
            slot += 1;
        }
        Ok(Layout {
            clique_size: self.width,
            colors: self.colors.clone(),
            slots: self.slots,
            positions: self.positions,
            poles: self.poles,
            segments: self.segments,
        })
    }

    /// Last slot a connection placed at `slot` can be wired to directly.
    fn reach(&self, slot: usize) -> usize {
        (slot / self.width + self.width) * self.width - 1
    }

    /// Slot taken by the combinator `offset` places after the next one, if no
    /// further poles are scheduled.
    fn estimated_slot(&self, from: usize, offset: usize) -> usize {
        let mut slot = from + offset;
        loop {
            let target = from + offset + self.scheduled.range(from..=slot).count();
            if target == slot {
                return slot;
            }
            slot = target;
        }
    }

    fn color(&self, wire: &str) -> std::result::Result<Color, LayoutError> {
        self.colors
            .get(wire)
            .copied()
            .ok_or_else(|| LayoutError::Uncolored {
                wire: wire.to_string(),
            })
    }

    /// Open ends whose next combinator would land out of reach, most urgent
    /// first.
    fn endangered(&self, slot: usize) -> Vec<(String, usize)> {
        let mut ends: Vec<(String, usize)> = self
            .open
            .iter()
            .filter_map(|(wire, end)| {
                let next = self.queues.get(wire)?.front()?;
                let Endpoint::Combinator { id, .. } = next else {
                    return None;
                };
                let reach = self.reach(end.slot);
                let offset = id.0.checked_sub(self.next_combinator)?;
                (self.estimated_slot(slot, offset) > reach).then(|| (wire.clone(), reach))
            })
            .collect();
        ends.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        ends
    }

    fn relay_endangered(&mut self, slot: usize) -> std::result::Result<(), LayoutError> {
        let limit = self.width * self.width;
        let mut iterations = 0;
        loop {
            let endangered = self.endangered(slot);
            if endangered.is_empty() {
                return Ok(());
            }
            iterations += 1;
            if iterations > limit {
                return Err(LayoutError::TooComplex { iterations, slot });
            }
            for (wire, reach) in endangered {
                self.relay(&wire, slot, reach).map_err(|e| match e {
                    LayoutError::TooComplex { slot, .. } => LayoutError::TooComplex { iterations, slot },
                    other => other,
                })?;
            }
        }
    }

    fn has_room(&self, pole: &Pole, wire: &str, color: Color) -> bool {
        pole.wires.len() < POLE_CAPACITY
            && !pole.wires.iter().any(|w| w == wire)
            && pole
                .wires
                .iter()
                .filter(|w| self.colors.get(w.as_str()) == Some(&color))
                .count()
                < POLE_COLOR_CAPACITY
    }

    /// Route a wire through a recent pole between `slot` and `reach`, or a new
    /// pole at the latest free slot in that range.
    fn relay(&mut self, wire: &str, slot: usize, reach: usize) -> std::result::Result<(), LayoutError> {
        let color = self.color(wire)?;
        let merge = self
            .recent
            .iter()
            .map(|&index| &self.poles[index])
            .filter(|p| p.slot >= slot && p.slot <= reach && self.has_room(p, wire, color))
            .max_by_key(|p| p.slot)
            .map(|p| p.index);

        let index = match merge {
            Some(index) => {
                log::trace!("slot {}: merging '{}' into pole P{}", slot, wire, index);
                index
            }
            None => {
                let target = (slot..=reach)
                    .rev()
                    .find(|s| !self.scheduled.contains_key(s))
                    .ok_or(LayoutError::TooComplex {
                        iterations: 0,
                        slot,
                    })?;
                let index = self.poles.len();
                self.poles.push(Pole {
                    index,
                    slot: target,
                    position: GridPosition::from_slot(target, self.width),
                    wires: Vec::new(),
                });
                self.scheduled.insert(target, index);
                self.recent.push_back(index);
                while self.recent.len() > self.window {
                    self.recent.pop_front();
                }
                log::trace!("slot {}: new pole P{} at slot {} for '{}'", slot, index, target, wire);
                index
            }
        };

        self.poles[index].wires.push(wire.to_string());
        self.queues
            .entry(wire.to_string())
            .or_default()
            .push_front(Endpoint::Pole { index });
        Ok(())
    }

    fn expire_recent(&mut self, slot: usize) {
        let poles = &self.poles;
        self.recent.retain(|&index| poles[index].slot >= slot);
    }

    fn place_pole(&mut self, index: usize, slot: usize) -> std::result::Result<(), LayoutError> {
        self.slots.push(NodeRef::Pole(index));
        let wires = self.poles[index].wires.clone();
        for wire in wires {
            self.connect(&wire, Endpoint::Pole { index }, slot)?;
        }
        Ok(())
    }

    fn place_combinator(&mut self, slot: usize) -> std::result::Result<(), LayoutError> {
        let id = CombinatorId(self.next_combinator);
        self.next_combinator += 1;
        self.slots.push(NodeRef::Combinator(id));
        self.positions[id.0] = GridPosition::from_slot(slot, self.width);
        let connections = self.connections;
        for (wire, side) in &connections[id.0] {
            self.connect(wire, Endpoint::Combinator { id, side: *side }, slot)?;
        }
        Ok(())
    }

    /// Consume the next connection point of a wire, emitting the segment from
    /// its previous end.
    fn connect(&mut self, wire: &str, endpoint: Endpoint, slot: usize) -> std::result::Result<(), LayoutError> {
        let queue = self.queues.entry(wire.to_string()).or_default();
        let popped = queue.pop_front();
        debug_assert_eq!(popped, Some(endpoint), "connections of '{}' out of order", wire);
        let more = !queue.is_empty();

        if let Some(end) = self.open.remove(wire) {
            let color = self.color(wire)?;
            self.segments.push(WireSegment {
                wire: wire.to_string(),
                color,
                from: end.endpoint,
                to: endpoint,
            });
        }
        if more {
            self.open.insert(wire.to_string(), OpenEnd { endpoint, slot });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CLIQUE_SIZE;
    use crate::{compile, compile_with_config, CompileConfig};

    fn assert_local(layout: &Layout) {
        for segment in layout.segments() {
            let distance = layout.row_distance(segment).unwrap();
            assert!(
                distance < layout.clique_size,
                "segment {} spans {} rows",
                segment,
                distance
            );
        }
    }

    /// `n` combinators; the first and last share wire `LONG`.
    fn long_wire(n: usize) -> String {
        let mut body = String::from("{x: 1} -> LONG\n");
        for i in 1..n - 1 {
            body.push_str(&format!("{{y: {}}} -> W{}\n", i, i));
        }
        body.push_str("LONG -> display x\n");
        format!("Main() {{\n{}}}", body)
    }

    #[test]
    fn test_empty_network() {
        let mut network = compile("Main() {}").unwrap();
        let layout = network.finalize().unwrap();
        assert!(layout.slots.is_empty());
        assert!(layout.poles.is_empty());
        assert!(layout.segments().is_empty());
    }

    #[test]
    fn test_neighbours_wire_directly() {
        let mut network = compile("Main() { {a: 1} -> A  A -> a + 1 as b -> B  B -> display b }").unwrap();
        let layout = network.finalize().unwrap();
        assert!(layout.poles.is_empty());
        assert_eq!(layout.rows().collect::<Vec<_>>(), vec![&layout.slots[..]]);
        assert_eq!(layout.segments().len(), 2);
        let first = &layout.segments()[0];
        assert_eq!(first.wire, "A");
        assert_eq!(first.color, Color::Red);
        assert_eq!(
            first.from,
            Endpoint::Combinator {
                id: CombinatorId(0),
                side: Side::Output
            }
        );
        assert_eq!(
            first.to,
            Endpoint::Combinator {
                id: CombinatorId(1),
                side: Side::Input
            }
        );
        assert_eq!(layout.position(NodeRef::Combinator(CombinatorId(2))), Some(GridPosition { x: 2, y: 0 }));
    }

    #[test]
    fn test_long_wire_gets_poles() {
        let mut network = compile(&long_wire(120)).unwrap();
        let layout = network.finalize().unwrap().clone();
        assert!(!layout.poles.is_empty());
        assert_local(&layout);
        let long: Vec<&WireSegment> = layout.segments().iter().filter(|s| s.wire == "LONG").collect();
        assert_eq!(long.len(), layout.poles.len() + 1);
        assert_eq!(long[0].from.node(), NodeRef::Combinator(CombinatorId(0)));
        assert_eq!(long.last().unwrap().to.node(), NodeRef::Combinator(CombinatorId(119)));
        for pair in long.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
    }

    #[test]
    fn test_wire_within_window_needs_no_pole() {
        let mut network = compile(&long_wire(CLIQUE_SIZE * CLIQUE_SIZE)).unwrap();
        let layout = network.finalize().unwrap();
        assert!(layout.poles.is_empty());
    }

    #[test]
    fn test_many_long_wires_share_poles() {
        let mut body = String::new();
        for i in 0..4 {
            body.push_str(&format!("{{s{}: 1}} -> L{}\n", i, i));
        }
        for i in 0..60 {
            body.push_str(&format!("{{y: {}}} -> F{}\n", i + 1, i));
        }
        for i in 0..4 {
            body.push_str(&format!("L{} -> display s{}\n", i, i));
        }
        let mut network = compile(&format!("Main() {{\n{}}}", body)).unwrap();
        let layout = network.finalize().unwrap();
        assert_local(layout);
        for pole in &layout.poles {
            assert!(pole.wires.len() <= POLE_CAPACITY);
            let red = pole
                .wires
                .iter()
                .filter(|w| layout.colors[w.as_str()] == Color::Red)
                .count();
            assert!(red <= POLE_COLOR_CAPACITY);
        }
        // Four red wires need two poles per hop, not four.
        let hops = layout.segments().iter().filter(|s| s.wire == "L0").count() - 1;
        assert!(layout.poles.len() <= hops * 2);
    }

    #[test]
    fn test_too_many_parallel_wires_fail() {
        let mut body = String::new();
        for i in 0..40 {
            body.push_str(&format!("{{s{}: 1}} -> L{}\n", i, i));
        }
        for i in 0..80 {
            body.push_str(&format!("{{y: {}}} -> F{}\n", i + 1, i));
        }
        for i in 0..40 {
            body.push_str(&format!("L{} -> display s{}\n", i, i));
        }
        let err = compile(&format!("Main() {{\n{}}}", body)).unwrap_err();
        assert!(matches!(
            err,
            crate::CnideError::Layout(LayoutError::TooComplex { .. })
        ));
    }

    #[test]
    fn test_every_connection_is_segmented() {
        let source = "Main() {
            {a: 1} -> (A, B)
            (A, B) -> a * 2 as a -> C
            C -> a > 1 then 1 as all -> (A, D)
            D -> display a
        }";
        let mut network = compile(source).unwrap();
        let layout = network.finalize().unwrap();
        // A: 3 connection points, B: 2, C: 2, D: 2
        assert_eq!(layout.segments().len(), 2 + 1 + 1 + 1);
    }

    #[test]
    fn test_small_clique_size() {
        let config = CompileConfig::default().with_clique_size(3);
        let mut network = compile_with_config(&long_wire(40), &config).unwrap();
        let layout = network.finalize().unwrap();
        assert_eq!(layout.clique_size, 3);
        assert!(!layout.poles.is_empty());
        assert_local(layout);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let source = long_wire(80);
        let a = compile(&source).unwrap().finalize().unwrap().clone();
        let b = compile(&source).unwrap().finalize().unwrap().clone();
        assert_eq!(a, b);
    }
}
