//! WASM bindings for Cnide.
//!
//! This module provides JavaScript-friendly bindings for the browser UI,
//! which renders the layout and drives the simulation clock.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmNetwork } from 'cnide';
//!
//! await init();
//!
//! const network = new WasmNetwork(`
//!   Main() {
//!     toggle {go: 1} -> A
//!     A -> go * 2 as x -> B
//!     B -> display x
//!   }
//! `);
//!
//! const layout = JSON.parse(network.layout_json());
//! network.set_active(0, true);
//! setInterval(() => {
//!   network.step();
//!   render(JSON.parse(network.state_json()));
//! }, 1000 / 60);
//! ```

use wasm_bindgen::prelude::*;

use crate::{compile_with_config, CircuitNetwork, CompileConfig};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// A compiled network driven from JavaScript.
#[wasm_bindgen]
pub struct WasmNetwork {
    network: CircuitNetwork,
}

#[wasm_bindgen]
impl WasmNetwork {
    /// Compile network source with default settings.
    ///
    /// # Returns
    /// A new `WasmNetwork`, or the error message if the source does not
    /// compile.
    #[wasm_bindgen(constructor)]
    pub fn new(source: &str) -> Result<WasmNetwork, JsValue> {
        Self::with_clique_size(source, crate::CLIQUE_SIZE)
    }

    /// Compile network source with a custom layout row width.
    #[wasm_bindgen]
    pub fn with_clique_size(source: &str, clique_size: usize) -> Result<WasmNetwork, JsValue> {
        let config = CompileConfig::default().with_clique_size(clique_size);
        let network = compile_with_config(source, &config).map_err(to_js)?;
        Ok(WasmNetwork { network })
    }

    /// Advance one tick.
    #[wasm_bindgen]
    pub fn step(&mut self) {
        self.network.step();
    }

    /// Advance `ticks` ticks.
    #[wasm_bindgen]
    pub fn run(&mut self, ticks: u32) {
        self.network.run(u64::from(ticks));
    }

    /// Number of ticks run so far.
    #[wasm_bindgen(getter)]
    pub fn tick(&self) -> f64 {
        self.network.tick() as f64
    }

    /// Current tick, wire state and display values as JSON.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.network.snapshot()).map_err(to_js)
    }

    /// Grid positions, poles, colors and segments as JSON.
    #[wasm_bindgen]
    pub fn layout_json(&mut self) -> Result<String, JsValue> {
        let layout = self.network.finalize().map_err(to_js)?;
        serde_json::to_string(layout).map_err(to_js)
    }

    /// Combinators with their kind and wiring as JSON.
    #[wasm_bindgen]
    pub fn combinators_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.network.combinators()).map_err(to_js)
    }

    /// Switch a toggle or pulse button on or off.
    #[wasm_bindgen]
    pub fn set_active(&mut self, index: usize, active: bool) -> Result<(), JsValue> {
        self.network.set_active(index, active).map_err(to_js)
    }

    /// Flip a toggle or pulse button.
    #[wasm_bindgen]
    pub fn toggle_active(&mut self, index: usize) -> Result<bool, JsValue> {
        self.network.toggle_active(index).map_err(to_js)
    }

    /// The value shown by a display combinator, or `undefined`.
    #[wasm_bindgen]
    pub fn display_value(&self, index: usize) -> Option<i32> {
        self.network.display_value(index)
    }

    /// The compact text of a display combinator, e.g. `12K`, or `undefined`.
    #[wasm_bindgen]
    pub fn display_readout(&self, index: usize) -> Option<String> {
        self.network.display_readout(index)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
