#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays an authored rail shooter level headlessly.

mod cutscene;
mod level;
mod marksman;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rail_shooter_core::seconds;

use crate::{
    level::Level,
    marksman::MarksmanConfig,
    simulation::{Settings, Simulation},
};

#[derive(Debug, Parser)]
#[command(
    name = "rail-shooter",
    version,
    about = "Plays an authored rail shooter level without rendering and prints a summary"
)]
struct CliArgs {
    /// Level file (TOML) to play.
    level: PathBuf,
    /// Length of one simulation tick in milliseconds.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
    /// Simulated time budget in seconds before the run is abandoned.
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f32,
    /// Seed for the scripted marksman.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Seconds between two marksman shots.
    #[arg(long, default_value_t = 0.35)]
    shot_interval: f32,
    /// Probability in `[0, 1]` that a shot hits.
    #[arg(long, default_value_t = 0.8)]
    accuracy: f64,
    /// Damage dealt by a hit.
    #[arg(long, default_value_t = 1)]
    damage: u32,
}

/// Entry point for the rail shooter command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_default_env().try_init();
    let args = CliArgs::parse();

    let level = Level::load(&args.level)
        .with_context(|| format!("failed to load level {}", args.level.display()))?;
    let settings = Settings {
        tick: Duration::from_millis(args.tick_ms),
        max_time: seconds(args.max_seconds),
        marksman: MarksmanConfig {
            shot_interval: seconds(args.shot_interval),
            accuracy: args.accuracy,
            damage: args.damage,
            seed: args.seed,
        },
    };

    let summary = Simulation::new(level, settings).run();
    println!("{summary}");
    ensure!(
        summary.route_completed(),
        "level did not complete within {} simulated seconds",
        args.max_seconds
    );
    Ok(())
}
