//! # waypoint-cli
//!
//! Command-line interface for a Waypoint goal graph persisted to a
//! JSON snapshot file:
//! - `waypoint goal add/list/show/complete/fail/cancel/undo` — manage goals
//! - `waypoint stats` — graph-wide analytics and the current bottleneck
//! - `waypoint cycles` — report dependency cycles
//! - `waypoint audit export/tail` — work with the JSONL audit trail
//! - `waypoint watch` — run the background execution loop over the graph

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Waypoint CLI — dependency-aware goal scheduling.
#[derive(Parser)]
#[command(name = "waypoint", version, about)]
struct Cli {
    /// Path of the graph snapshot file.
    #[arg(long, default_value = "waypoint.json")]
    graph: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
    /// Graph-wide analytics.
    Stats,
    /// Report dependency cycles.
    Cycles,
    /// Work with the JSONL audit trail.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
    /// Run the execution loop over the graph.
    Watch {
        /// Milliseconds between ticks.
        #[arg(long, default_value_t = 5_000)]
        interval_ms: u64,
        /// Stop after this many ticks (0 = run until killed).
        #[arg(long, default_value_t = 0)]
        ticks: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("waypoint_graph=info".parse()?)
                .add_directive("waypoint_runtime=info".parse()?)
                .add_directive("waypoint_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Goal { command } => commands::goal::execute(command, &cli.graph),
        Commands::Stats => commands::stats::execute(&cli.graph),
        Commands::Cycles => commands::cycles::execute(&cli.graph),
        Commands::Audit { command } => commands::audit::execute(command, &cli.graph),
        Commands::Watch { interval_ms, ticks } => {
            commands::watch::execute(&cli.graph, *interval_ms, *ticks)
        }
    }
}
