//! # Delve Main Entry Point
//!
//! Generates a dungeon, spawns the roster and runs the behavior loop
//! headlessly, printing the final map and a JSON summary.

use clap::Parser;
use delve::{
    AsciiRenderer, DelveResult, GenerationConfig, Simulation, SimulationConfig,
};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Command line arguments for the Delve simulation.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Random-walk dungeon carver and NPC combat simulation")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation and behavior
    #[arg(short, long)]
    seed: Option<u64>,

    /// Dungeon width in tiles
    #[arg(long)]
    width: Option<usize>,

    /// Dungeon height in tiles
    #[arg(long)]
    height: Option<usize>,

    /// Number of monsters to spawn
    #[arg(short, long)]
    monsters: Option<usize>,

    /// Maximum number of ticks to simulate
    #[arg(short, long, default_value_t = 3600)]
    ticks: u64,

    /// Print a JSON snapshot line every N ticks (0 disables)
    #[arg(long, default_value_t = 0)]
    snapshot_every: u64,

    /// JSON file with `generation` and `simulation` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace, or module=level)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Layout of the `--config` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    generation: GenerationConfig,
    simulation: SimulationConfig,
}

fn main() -> DelveResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting Delve v{}", delve::VERSION);

    let mut file_config = match &args.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    apply_overrides(&args, &mut file_config);

    run(&args, file_config)
}

/// Initializes the logging system from a filter string.
fn initialize_logging(log_level: &str) -> DelveResult<()> {
    env_logger::Builder::new()
        .parse_filters(log_level)
        .format_timestamp_millis()
        .init();
    Ok(())
}

fn load_config(path: &Path) -> DelveResult<FileConfig> {
    info!("Loading configuration from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn apply_overrides(args: &Args, config: &mut FileConfig) {
    if let Some(seed) = args.seed {
        config.generation.seed = seed;
    }
    if let Some(width) = args.width {
        config.generation.width = width;
    }
    if let Some(height) = args.height {
        config.generation.height = height;
    }
    if let Some(monsters) = args.monsters {
        config.simulation.monster_count = monsters;
    }
}

/// Runs the headless simulation loop.
fn run(args: &Args, config: FileConfig) -> DelveResult<()> {
    info!("Generating dungeon with seed: {}", config.generation.seed);
    let mut simulation = Simulation::new(&config.generation, config.simulation)?;
    let mut renderer = AsciiRenderer::new();

    while simulation.tick() < args.ticks && !simulation.is_finished() {
        simulation.step();
        simulation.present(&mut renderer);

        if args.snapshot_every > 0 && simulation.tick() % args.snapshot_every == 0 {
            let line = serde_json::json!({
                "tick": simulation.tick(),
                "entities": simulation.snapshots(),
            });
            println!("{}", line);
        }
    }

    info!(
        "Simulation ended after {} ticks ({:.1}s): {:?}",
        simulation.tick(),
        simulation.time(),
        simulation.completion_state
    );

    renderer.sync(&simulation.snapshots());
    print!("{}", renderer.render(simulation.grid()));
    for line in renderer.status_lines() {
        println!("{}", line);
    }
    println!("{}", serde_json::to_string_pretty(&simulation.summary())?);
    Ok(())
}
