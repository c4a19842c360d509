//! Headless skirmish runner.
//!
//! This binary runs the simulation without a window.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p skirmish_headless
//!
//! # Protocol session on a scenario file
//! cargo run -p skirmish_headless -- run --scenario scenarios/ford.ron --auto-state
//!
//! # Watch a scenario in the terminal
//! cargo run -p skirmish_headless -- watch --ticks 400
//!
//! # Replay a scenario several times and compare hashes
//! cargo run -p skirmish_headless -- verify --runs 10
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): filtered by `RUST_LOG`, default `info` (`debug` with `-v`)

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_core::prelude::*;
use skirmish_headless::{
    ascii::{AsciiConfig, AsciiRenderer},
    runner::{replay, HeadlessConfig, HeadlessRunner},
    scenario::{Scenario, ScriptCursor},
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish runner for scripted sessions and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive protocol session
    Run {
        /// Scenario file to load (default: built-in outpost)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Output state after every tick command
        #[arg(long)]
        auto_state: bool,
    },

    /// Play a scenario in real time with ASCII rendering
    Watch {
        /// Scenario file to load (default: built-in outpost)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Stop after this many ticks
        #[arg(short, long, default_value = "600")]
        ticks: u64,

        /// Disable ANSI colors and screen clearing
        #[arg(long)]
        no_color: bool,

        /// Frame interval in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: u64,
    },

    /// Replay a scenario several times and compare state hashes
    Verify {
        /// Scenario file to load (default: built-in outpost)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run
        #[arg(short, long, default_value = "600")]
        ticks: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            auto_state,
        }) => cmd_run(scenario, auto_state),
        Some(Commands::Watch {
            scenario,
            ticks,
            no_color,
            frame_ms,
        }) => cmd_watch(scenario, ticks, no_color, frame_ms),
        Some(Commands::Verify {
            scenario,
            runs,
            ticks,
        }) => cmd_verify(scenario, runs, ticks),
        None => cmd_run(None, false),
    }
}

fn load_scenario(path: Option<PathBuf>) -> Scenario {
    let loaded = match &path {
        Some(path) => Scenario::load(path),
        None => Scenario::outpost(),
    };
    match loaded {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(error = %e, path = ?path, "Failed to load scenario");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_run(scenario: Option<PathBuf>, auto_state: bool) {
    let scenario = load_scenario(scenario);
    let config = HeadlessConfig {
        auto_state_output: auto_state,
        ..HeadlessConfig::default()
    };

    let mut runner = match HeadlessRunner::from_scenario(&scenario, config) {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build scenario");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = runner.run(stdin.lock(), stdout.lock()) {
        tracing::error!(error = %e, "Session failed");
        std::process::exit(1);
    }
}

fn cmd_watch(scenario: Option<PathBuf>, max_ticks: u64, no_color: bool, frame_ms: u64) {
    let scenario = load_scenario(scenario);
    let state = match scenario.build_state() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build scenario");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        scenario = %scenario.name,
        fps = state.config().fps,
        max_ticks = max_ticks,
        script = scenario.script.len(),
        "Watching scenario"
    );

    let ascii = AsciiConfig {
        show_legend: true,
        use_color: !no_color,
    };
    let mut renderer = AsciiRenderer::new(std::io::stdout(), ascii, !no_color);
    let mut cursor = ScriptCursor::new(&scenario.script);
    let started = Instant::now();
    let now_ms = || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut sim = Simulation::new(state, now_ms());

    while sim.state().tick() < max_ticks {
        for outcome in cursor.apply_due(sim.state_mut()) {
            tracing::info!(tick = sim.state().tick(), outcome = ?outcome, "Scripted click");
        }
        sim.tick(now_ms(), &mut renderer);
        std::thread::sleep(Duration::from_millis(frame_ms));
    }

    eprintln!(
        "Stopped after {} ticks in {:.1}s (hash {:016x})",
        sim.state().tick(),
        started.elapsed().as_secs_f64(),
        sim.state().state_hash()
    );
}

fn cmd_verify(scenario: Option<PathBuf>, runs: u32, ticks: u64) {
    let scenario = load_scenario(scenario);
    tracing::info!(scenario = %scenario.name, runs = runs, ticks = ticks, "Verifying determinism");

    let mut results = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        match replay(&scenario, ticks) {
            Ok(result) => {
                tracing::debug!(run = run, hash = ?result.final_hash(), "Run complete");
                results.push(result);
            }
            Err(e) => {
                tracing::error!(error = %e, run = run, "Replay failed");
                eprintln!("FATAL: {e}");
                std::process::exit(1);
            }
        }
    }

    let Some(reference) = results.first() else {
        eprintln!("Nothing to verify");
        return;
    };

    let mut diverged = false;
    for (run, result) in results.iter().enumerate().skip(1) {
        let divergence = reference
            .hashes
            .iter()
            .zip(&result.hashes)
            .position(|(a, b)| a != b);
        if let Some(tick) = divergence {
            diverged = true;
            eprintln!("Run {run} diverged from run 0 at tick {}", tick + 1);
        }
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("DETERMINISM CHECK");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Scenario: {}", scenario.name);
    eprintln!("Runs: {runs}  Ticks per run: {ticks}");
    eprintln!("Scripted clicks rejected: {}", reference.rejected());
    match reference.final_hash() {
        Some(hash) => eprintln!("Final hash: {hash:016x}"),
        None => eprintln!("Final hash: none"),
    }

    if diverged {
        eprintln!("Result: FAILED");
        std::process::exit(1);
    }
    eprintln!("Result: deterministic");
}
