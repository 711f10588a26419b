//! # engine_app runner
//!
//! Loads a scene and runs it until it stops.
//!
//! ```text
//! engine_app scenes/pong --tick-rate 60 --compath target/debug
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_app::{Engine, EngineConfig};

/// Component-assembly runtime.
#[derive(Debug, Parser)]
#[command(name = "engine_app", version, about)]
struct Args {
    /// Scene to load; `.json` is appended when no extension is given.
    scene: String,

    /// Target ticks per second.
    #[arg(long, default_value_t = 90.0)]
    tick_rate: f64,

    /// Stop after this many ticks (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    max_ticks: u64,

    /// Comma-separated module search path, overriding the scene's.
    #[arg(long)]
    compath: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let args = Args::parse();
    info!(version = Engine::version(), scene = %args.scene, "engine starting");

    let mut config = EngineConfig::new()
        .with_tick_rate(args.tick_rate)
        .with_max_ticks(args.max_ticks)
        .with_builtins(engine_builtin::builtins());
    if let Some(compath) = args.compath {
        config = config.with_compath(compath);
    }

    let mut engine = Engine::new(config);
    engine
        .load_scene(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene))?;
    let ticks = engine.run()?;

    info!(ticks, "engine shut down");
    Ok(())
}
