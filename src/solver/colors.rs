//! Red/green wire coloring.
//!
//! Wires on the same side of a combinator must use different physical
//! channels, so every such pair is an "opposite" constraint. The solver keeps
//! an arena of disjoint-set classes; each class root points at the root of its
//! opposite class. A conflict is reported as soon as a constraint contradicts
//! the classes built so far, which lets the compiler blame the statement that
//! introduced it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::error::{CnideError, Result};

/// Physical wire channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Green => write!(f, "green"),
        }
    }
}

/// Sentinel wire standing for the red channel.
const RED_SENTINEL: &str = ".red";
/// Sentinel wire standing for the green channel.
const GREEN_SENTINEL: &str = ".green";

/// One disjoint-set node. Only roots have meaningful `size` and `opposite`.
#[derive(Debug, Clone)]
struct ClassNode {
    parent: usize,
    size: usize,
    opposite: usize,
}

/// Incremental 2-coloring of wires.
#[derive(Debug, Clone)]
pub struct WireColorSolver {
    nodes: Vec<ClassNode>,
    /// Wire name to its node index
    wires: HashMap<String, usize>,
    /// Wires in registration order, sentinels first
    order: Vec<String>,
    /// Prior node states, recorded while a batch may still be rolled back
    journal: Option<Vec<(usize, ClassNode)>>,
}

impl Default for WireColorSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl WireColorSolver {
    /// Create a solver seeded with the red and green sentinel classes.
    pub fn new() -> Self {
        let mut solver = Self {
            nodes: Vec::new(),
            wires: HashMap::new(),
            order: Vec::new(),
            journal: None,
        };
        let red = solver.register(RED_SENTINEL);
        let green = solver.register(GREEN_SENTINEL);
        solver.nodes[red].opposite = green;
        solver.nodes[green].opposite = red;
        solver
    }

    /// Register the wires attached to one side of a combinator.
    ///
    /// One wire is only registered; two wires must get opposite colors.
    pub fn add(&mut self, wires: &[String]) -> Result<()> {
        match wires {
            [] => Ok(()),
            [wire] => {
                self.register(wire);
                Ok(())
            }
            [a, b] => self.add_opposite(a, b),
            _ => Err(CnideError::TooManyWires {
                count: wires.len(),
                location: None,
            }),
        }
    }

    /// Apply the wires of several combinator sides, all or nothing. On a
    /// conflict the solver is left as it was before the call.
    pub fn add_all(&mut self, sides: &[&[String]]) -> Result<()> {
        let nodes = self.nodes.len();
        let order = self.order.len();
        self.journal = Some(Vec::new());
        let result = sides.iter().try_for_each(|wires| self.add(wires));
        let journal = self.journal.take().unwrap_or_default();
        if result.is_err() {
            for (index, node) in journal.into_iter().rev() {
                if index < nodes {
                    self.nodes[index] = node;
                }
            }
            self.nodes.truncate(nodes);
            for wire in self.order.drain(order..) {
                self.wires.remove(&wire);
            }
        }
        result
    }

    /// Pin a wire to a color.
    pub fn force_color(&mut self, wire: &str, color: Color) -> Result<()> {
        match color {
            Color::Red => self.add_opposite(wire, GREEN_SENTINEL),
            Color::Green => self.add_opposite(wire, RED_SENTINEL),
        }
    }

    /// Require two wires to have different colors.
    pub fn add_opposite(&mut self, a: &str, b: &str) -> Result<()> {
        let ia = self.register(a);
        let ib = self.register(b);
        let ra = self.find(ia);
        let rb = self.find(ib);
        if ra == rb {
            return Err(CnideError::color_conflict(a, b));
        }
        let oa = self.find(self.nodes[ra].opposite);
        let ob = self.find(self.nodes[rb].opposite);
        let new_a = self.union(ra, ob).ok_or_else(|| CnideError::color_conflict(a, b))?;
        let new_b = self.union(rb, oa).ok_or_else(|| CnideError::color_conflict(a, b))?;
        self.save(new_a);
        self.save(new_b);
        self.nodes[new_a].opposite = new_b;
        self.nodes[new_b].opposite = new_a;
        Ok(())
    }

    /// Require two wires to have the same color.
    pub fn add_same(&mut self, a: &str, b: &str) -> Result<()> {
        let ia = self.register(a);
        let ib = self.register(b);
        let ra = self.find(ia);
        let rb = self.find(ib);
        if ra == rb {
            return Ok(());
        }
        let oa = self.find(self.nodes[ra].opposite);
        let ob = self.find(self.nodes[rb].opposite);
        let same = self.union(ra, rb).ok_or_else(|| CnideError::color_conflict(a, b))?;
        let opposite = self.union(oa, ob).ok_or_else(|| CnideError::color_conflict(a, b))?;
        self.save(same);
        self.save(opposite);
        self.nodes[same].opposite = opposite;
        self.nodes[opposite].opposite = same;
        Ok(())
    }

    /// Final wire colors. Red is preferred for otherwise unconstrained classes,
    /// deciding in wire registration order.
    pub fn colors(&self) -> BTreeMap<String, Color> {
        let mut class_colors: HashMap<usize, Color> = HashMap::new();
        let mut colors = BTreeMap::new();
        for wire in &self.order {
            let root = self.root(self.wires[wire]);
            let color = match class_colors.get(&root) {
                Some(&color) => color,
                None => {
                    class_colors.insert(root, Color::Red);
                    class_colors.insert(self.root(self.nodes[root].opposite), Color::Green);
                    Color::Red
                }
            };
            if wire != RED_SENTINEL && wire != GREEN_SENTINEL {
                colors.insert(wire.clone(), color);
            }
        }
        colors
    }

    fn register(&mut self, wire: &str) -> usize {
        if let Some(&index) = self.wires.get(wire) {
            return index;
        }
        let index = self.nodes.len();
        // The wire's class and its (initially empty) opposite class.
        self.nodes.push(ClassNode {
            parent: index,
            size: 1,
            opposite: index + 1,
        });
        self.nodes.push(ClassNode {
            parent: index + 1,
            size: 0,
            opposite: index,
        });
        self.wires.insert(wire.to_string(), index);
        self.order.push(wire.to_string());
        index
    }

    fn find(&mut self, mut x: usize) -> usize {
        let root = self.root(x);
        while self.nodes[x].parent != root {
            let next = self.nodes[x].parent;
            self.save(x);
            self.nodes[x].parent = root;
            x = next;
        }
        root
    }

    fn save(&mut self, index: usize) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push((index, self.nodes[index].clone()));
        }
    }

    fn root(&self, mut x: usize) -> usize {
        while self.nodes[x].parent != x {
            x = self.nodes[x].parent;
        }
        x
    }

    /// Merge two roots, smaller into larger. `None` if they are opposites.
    fn union(&mut self, a: usize, b: usize) -> Option<usize> {
        if a == b {
            return Some(a);
        }
        if self.find(self.nodes[a].opposite) == b {
            return None;
        }
        let (large, small) = if self.nodes[a].size < self.nodes[b].size {
            (b, a)
        } else {
            (a, b)
        };
        self.save(small);
        self.save(large);
        self.nodes[small].parent = large;
        self.nodes[large].size += self.nodes[small].size;
        Some(large)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wires(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unconstrained_wires_are_red() {
        let mut solver = WireColorSolver::new();
        solver.add(&wires(&["A"])).unwrap();
        solver.add(&wires(&["B"])).unwrap();
        let colors = solver.colors();
        assert_eq!(colors["A"], Color::Red);
        assert_eq!(colors["B"], Color::Red);
        assert!(!colors.contains_key(RED_SENTINEL));
    }

    #[test]
    fn test_pair_gets_opposite_colors() {
        let mut solver = WireColorSolver::new();
        solver.add(&wires(&["A", "B"])).unwrap();
        solver.add(&wires(&["B", "C"])).unwrap();
        let colors = solver.colors();
        assert_eq!(colors["A"], Color::Red);
        assert_eq!(colors["B"], Color::Green);
        assert_eq!(colors["C"], Color::Red);
    }

    #[test]
    fn test_odd_cycle_conflicts() {
        let mut solver = WireColorSolver::new();
        solver.add(&wires(&["A", "B"])).unwrap();
        solver.add(&wires(&["B", "C"])).unwrap();
        match solver.add(&wires(&["A", "C"])) {
            Err(CnideError::ColorConflict { first, second, .. }) => {
                assert_eq!(first, "A");
                assert_eq!(second, "C");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_same_and_opposite_conflict_names_both_wires() {
        let mut solver = WireColorSolver::new();
        solver.add_same("X", "Y").unwrap();
        let err = solver.add_opposite("X", "Y").unwrap_err();
        assert!(matches!(
            err,
            CnideError::ColorConflict { ref first, ref second, .. } if first == "X" && second == "Y"
        ));
        let message = err.to_string();
        assert!(message.contains("X") && message.contains("Y"));

        let mut solver = WireColorSolver::new();
        solver.add_opposite("X", "Y").unwrap();
        assert!(solver.add_same("X", "Y").is_err());
    }

    #[test]
    fn test_forced_colors() {
        let mut solver = WireColorSolver::new();
        solver.add(&wires(&["A", "B"])).unwrap();
        solver.force_color("A", Color::Green).unwrap();
        let colors = solver.colors();
        assert_eq!(colors["A"], Color::Green);
        assert_eq!(colors["B"], Color::Red);
        assert!(solver.force_color("B", Color::Green).is_err());
    }

    #[test]
    fn test_too_many_wires() {
        let mut solver = WireColorSolver::new();
        assert!(matches!(
            solver.add(&wires(&["A", "B", "C"])),
            Err(CnideError::TooManyWires { count: 3, .. })
        ));
    }

    #[test]
    fn test_large_classes_merge() {
        let mut solver = WireColorSolver::new();
        for i in 0..50 {
            solver
                .add(&[format!("W{}", i), format!("W{}", i + 1)])
                .unwrap();
        }
        let colors = solver.colors();
        for i in 0..=50 {
            let expected = if i % 2 == 0 { Color::Red } else { Color::Green };
            assert_eq!(colors[&format!("W{}", i)], expected);
        }
        assert!(solver.add_opposite("W0", "W2").is_err());
        assert!(solver.add_opposite("W0", "W3").is_ok());
    }

    #[test]
    fn test_rejected_batch_leaves_no_constraints() {
        let mut solver = WireColorSolver::new();
        solver.add(&wires(&["A", "B"])).unwrap();
        let err = solver
            .add_all(&[wires(&["C", "A"]).as_slice(), wires(&["C", "B"]).as_slice()])
            .unwrap_err();
        assert!(matches!(err, CnideError::ColorConflict { .. }));
        assert!(!solver.colors().contains_key("C"));

        // C opposite B only holds if C opposite A was rolled back.
        solver.add_all(&[wires(&["C", "B"]).as_slice()]).unwrap();
        let colors = solver.colors();
        assert_eq!(colors["A"], Color::Red);
        assert_eq!(colors["B"], Color::Green);
        assert_eq!(colors["C"], Color::Red);
    }
}
