#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a seeded Siege scenario headlessly.

mod config;
mod headless;
mod scenario;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use siege_core::Color;
use siege_rendering::{Presentation, RenderingBackend, Viewport};

use crate::{config::ScenarioConfig, headless::HeadlessBackend, scenario::Scenario};

const SCREEN_WIDTH: f32 = 1280.0;
const SCREEN_HEIGHT: f32 = 720.0;

/// Command-line arguments accepted by the Siege binary.
#[derive(Debug, Parser)]
#[command(name = "siege", about = "Headless tower-defence simulation")]
struct CliArgs {
    /// TOML scenario file; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Upper bound on simulated frames.
    #[arg(long, default_value_t = 3_600)]
    frames: u64,

    /// Seed for tower drops, spawn jitter and heal targets.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long)]
    verbose: bool,
}

/// Entry point for the Siege command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = ScenarioConfig::load(args.config.as_deref())?;
    let viewport = Viewport::new(SCREEN_WIDTH, SCREEN_HEIGHT, config.columns, config.rows)?;
    let mut scenario = Scenario::build(&config, args.seed, &viewport)?;
    log::info!(
        "running {}x{} scenario with seed {} at {} fps",
        config.columns,
        config.rows,
        args.seed,
        config.frame_rate().get()
    );

    let presentation = Presentation::new("Siege", Color::from_rgb_u8(24, 28, 32), viewport);
    HeadlessBackend::new(args.frames, config.frame_rate()).run(
        presentation,
        |_delta, surface| {
            let _ = scenario.advance()?;
            scenario.draw(surface);
            Ok(!scenario.is_finished())
        },
    )?;

    log::info!("{}", scenario.summary());
    Ok(())
}
