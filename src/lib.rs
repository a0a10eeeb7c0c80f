//! # Cnide
//!
//! A compiler, tick simulator and layout engine for combinator circuit
//! networks.
//!
//! This library provides:
//! - A small DSL for describing networks of constant, arithmetic, decider and
//!   display combinators connected by named wires
//! - Sub-network templates expanded into one flat network
//! - A lock-step tick simulator with 32-bit saturating signal values
//! - A red/green wire color solver
//! - A grid layout that inserts relay poles so every wire segment stays short
//!
//! ## Architecture
//!
//! - [`dsl`] - Lexer, parser and syntax tree of the network language
//! - [`circuit`] - Expansion, the flat network and its simulation
//! - [`components`] - Combinator models
//! - [`signal`] - Signal sets and value clamping
//! - [`solver`] - Wire color constraints
//! - [`layout`] - Grid placement, relay poles and wire segments
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! RUST_LOG=debug cnide counter.cn --ticks 10 --layout
//! ```
//!
//! ### Library
//!
//! ```
//! let mut network = cnide::compile("Main() { {x: 1} -> C  C -> x + 0 as x -> C }")?;
//! network.run(3);
//! assert_eq!(network.wire("C").get("x"), 3);
//! # Ok::<(), cnide::CnideError>(())
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmNetwork } from 'cnide';
//!
//! const network = new WasmNetwork(source);
//! network.run(10);
//! const state = JSON.parse(network.state_json());
//! ```

pub mod circuit;
pub mod components;
pub mod dsl;
pub mod error;
pub mod layout;
pub mod signal;
pub mod solver;

// Re-export main types for convenience
pub use circuit::{CircuitNetwork, CombinatorId};
pub use error::{CnideError, LayoutError, Result};
pub use layout::{Layout, LayoutConfig, Segmenter, WireSegment, CLIQUE_SIZE};
pub use signal::{SignalSet, State};
pub use solver::{Color, WireColorSolver};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmNetwork;

/// Default limit on nested sub-network instantiations.
pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 32;

/// Compiler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileConfig {
    /// Deepest allowed chain of nested instantiations
    pub max_expansion_depth: usize,
    pub layout: LayoutConfig,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
            layout: LayoutConfig::default(),
        }
    }
}

impl CompileConfig {
    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    pub fn with_clique_size(mut self, clique_size: usize) -> Self {
        self.layout = self.layout.with_clique_size(clique_size);
        self
    }

    pub fn with_recent_pole_window(mut self, window: usize) -> Self {
        self.layout = self.layout.with_recent_pole_window(window);
        self
    }
}

/// Compile source text with default settings.
pub fn compile(source: &str) -> Result<CircuitNetwork> {
    compile_with_config(source, &CompileConfig::default())
}

/// Compile source text: parse, expand sub-networks, build and color the
/// network, and lay it out.
pub fn compile_with_config(source: &str, config: &CompileConfig) -> Result<CircuitNetwork> {
    let program = dsl::parse(source)?;
    compile_program(&program, config)
}

/// Compile an already parsed program.
pub fn compile_program(program: &dsl::Program, config: &CompileConfig) -> Result<CircuitNetwork> {
    let statements = circuit::expand(program, config.max_expansion_depth)?;
    let mut network = CircuitNetwork::from_statements(&statements, config.layout.clone())?;
    circuit::check_wires(network.combinators());
    let layout = network.finalize()?;
    log::debug!(
        "laid out {} slots with {} poles and {} segments",
        layout.slots.len(),
        layout.poles.len(),
        layout.segments().len()
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_runs_layout() {
        let network = compile("Main() { {a: 1} -> A  A -> display a }").unwrap();
        assert_eq!(network.layout().unwrap().segments().len(), 1);
    }

    #[test]
    fn test_config_builders() {
        let config = CompileConfig::default()
            .with_max_expansion_depth(4)
            .with_clique_size(1)
            .with_recent_pole_window(0);
        assert_eq!(config.max_expansion_depth, 4);
        assert_eq!(config.layout.clique_size, 2);
        assert_eq!(config.layout.recent_pole_window, 1);
    }

    #[test]
    fn test_depth_limit_is_configurable() {
        let source = "Main() { A() } A() { B() } B() { {x: 1} -> W }";
        assert!(compile(source).is_ok());
        let config = CompileConfig::default().with_max_expansion_depth(1);
        assert!(matches!(
            compile_with_config(source, &config),
            Err(CnideError::RecursionLimit { ref name, depth: 1, .. }) if name == "B"
        ));
    }
}
