/*
 * Boid Flocking Simulation
 *
 * Headless runner for the flocking core. It loads parameters (from a TOML
 * file and/or command-line flags), steps the flock for a number of ticks and
 * logs a summary of the flock's motion as it goes. Set RUST_LOG to control
 * verbosity, e.g. RUST_LOG=boids=debug.
 */

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use boids::{Simulation, SimulationParams, TickMode};

#[derive(Parser, Debug)]
#[command(name = "boids", about = "Run a headless boid flocking simulation")]
struct Args {
    /// TOML file with simulation parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Override the number of boids
    #[arg(short, long)]
    boids: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Update boids in place instead of from a consistent snapshot
    #[arg(long)]
    in_place: bool,

    /// Compute steering forces on all cores
    #[arg(long)]
    parallel: bool,

    /// Log a report every N ticks (0 disables periodic reports)
    #[arg(long, default_value_t = 60)]
    report_every: u64,

    /// Restart the flock every N ticks (0 never restarts)
    #[arg(long, default_value_t = 0)]
    restart_every: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let params = load_params(&args)?;

    info!(
        boids = params.num_boids,
        width = params.domain.width,
        height = params.domain.height,
        mode = ?params.tick_mode,
        parallel = params.parallel,
        "starting simulation"
    );

    let mut simulation = Simulation::new(params).context("failed to create simulation")?;
    let mut total = Duration::ZERO;

    for tick in 1..=args.ticks {
        let report = simulation.step()?;
        total += report.elapsed;

        if args.report_every > 0 && tick % args.report_every == 0 {
            info!(
                tick,
                mean_neighbors = report.mean_neighbors(),
                strong_separations = report.strong_separations,
                mean_speed = report.mean_speed,
                polarization = report.polarization,
                tick_ms = report.elapsed.as_secs_f64() * 1000.0,
                "flock report"
            );
        }

        if args.restart_every > 0 && tick % args.restart_every == 0 {
            simulation.reset()?;
            info!(tick, "flock restarted");
        }
    }

    if args.ticks > 0 {
        info!(
            ticks = args.ticks,
            avg_tick_ms = total.as_secs_f64() * 1000.0 / args.ticks as f64,
            "simulation finished"
        );
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

fn load_params(args: &Args) -> Result<SimulationParams> {
    let mut params = match &args.config {
        Some(path) => SimulationParams::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimulationParams::default(),
    };

    if let Some(boids) = args.boids {
        params.num_boids = boids;
    }
    if args.seed.is_some() {
        params.seed = args.seed;
    }
    if args.in_place {
        params.tick_mode = TickMode::InPlace;
    }
    if args.parallel {
        params.parallel = true;
    }

    params.validate().context("invalid simulation parameters")?;
    Ok(params)
}
