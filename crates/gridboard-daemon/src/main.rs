//! Gridboard Daemon - Main entry point
//!
//! Loads a simulated grid and drives report cycles against it, mirroring
//! every configured panel into an output directory.

mod config;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use gridboard_sim::{SimHost, World};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::runner::{PanelMirror, Runner};

#[derive(Parser, Debug)]
#[command(name = "gridboard")]
#[command(about = "Device status dashboards with TTL-cached discovery")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "gridboard.toml")]
    config: PathBuf,

    /// Path to the world fixture (overrides the configuration)
    #[arg(short, long)]
    world: Option<PathBuf>,

    /// Directory for mirrored panel text (overrides the configuration)
    #[arg(short, long)]
    output: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Gridboard v{}", env!("CARGO_PKG_VERSION"));

    if args.init_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    if let Some(world) = args.world {
        config.world.path = world.display().to_string();
    }
    if let Some(output) = args.output {
        config.output.dir = output;
    }
    if let Some(cycles) = args.cycles {
        config.scheduler.max_cycles = cycles;
    }

    info!(
        world = %config.world.path,
        ttl_secs = config.scheduler.registry_ttl_secs,
        interval_ms = config.scheduler.interval_ms,
        "Configuration loaded"
    );

    let world = World::from_file(Path::new(&config.world.path))
        .with_context(|| format!("Failed to load world {}", config.world.path))?;
    let host = SimHost::from_world(world);
    let mirror = PanelMirror::new(PathBuf::from(&config.output.dir))?;

    let mut runner = Runner::new(&config, host, Some(mirror));
    let cycles = runner.run(config.interval(), config.scheduler.max_cycles).await?;

    let registry = runner.orchestrator().registry();
    info!(
        cycles = cycles,
        rescans = registry.rescans(),
        devices = runner.host().device_count(),
        "Stopped"
    );

    Ok(())
}
