//! Cnide - combinator network compiler and simulator
//!
//! Compiles a network file, runs it for a number of ticks and prints the
//! resulting wire state.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cnide counter.cn --ticks 10 --activate 0 --layout
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use cnide::{
    circuit::StateSnapshot, compile_program, dsl, error::Result, CircuitNetwork, CompileConfig, Layout,
    CLIQUE_SIZE, DEFAULT_MAX_EXPANSION_DEPTH,
};

/// Combinator network compiler and tick simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the network description file
    #[arg(value_name = "NETWORK_FILE")]
    network_file: PathBuf,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 1)]
    ticks: u64,

    /// Also print wire colors and wire segments
    #[arg(short, long)]
    layout: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Row width of the layout grid
    #[arg(long, default_value_t = CLIQUE_SIZE)]
    clique_size: usize,

    /// Maximum nesting depth of sub-network instantiations
    #[arg(long, default_value_t = DEFAULT_MAX_EXPANSION_DEPTH)]
    max_depth: usize,

    /// Switch on toggle or pulse buttons before the first tick
    #[arg(short, long, value_name = "INDEX", num_args = 1..)]
    activate: Vec<usize>,
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    snapshot: StateSnapshot<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout: Option<&'a Layout>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Parse and compile
    let program = dsl::parse_file(&args.network_file)?;
    let config = CompileConfig::default()
        .with_clique_size(args.clique_size)
        .with_max_expansion_depth(args.max_depth);
    let mut network = compile_program(&program, &config)?;

    for &index in &args.activate {
        network.set_active(index, true)?;
    }

    // Simulate
    network.run(args.ticks);

    if args.json {
        let report = Report {
            snapshot: network.snapshot(),
            layout: if args.layout { network.layout() } else { None },
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_state(&network);
        if args.layout {
            if let Some(layout) = network.layout() {
                print_layout(layout);
            }
        }
    }

    Ok(())
}

fn print_state(network: &CircuitNetwork) {
    println!("tick {}", network.tick());
    let width = network.state().keys().map(String::len).max().unwrap_or(0);
    for (wire, signals) in network.state() {
        println!("  {:<width$}  {}", wire, signals, width = width);
    }
    for node in network.combinators() {
        if let Some(readout) = network.display_readout(node.id.0) {
            println!("  {} {}: {}", node.id, node.combinator, readout);
        }
    }
}

fn print_layout(layout: &Layout) {
    println!("colors");
    for (wire, color) in &layout.colors {
        println!("  {} {}", wire, color);
    }
    println!("grid");
    for row in layout.rows() {
        let cells: Vec<String> = row.iter().map(|node| node.to_string()).collect();
        println!("  {}", cells.join(" "));
    }
    println!("poles {}", layout.poles.len());
    for pole in &layout.poles {
        println!("  P{} at {}: {}", pole.index, pole.position, pole.wires.join(", "));
    }
    println!("segments {}", layout.segments().len());
    for segment in layout.segments() {
        println!("  {}", segment);
    }
}
