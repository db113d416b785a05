// audit.rs — Audit trail subcommands: export, tail.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use waypoint_audit::AuditLog;

use super::load_graph;

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Dump the graph's full audit trail to a JSONL file.
    Export {
        /// Output file (appended to if it exists).
        #[arg(long, default_value = "waypoint-audit.jsonl")]
        out: PathBuf,
    },
    /// Print the last records of a JSONL audit log.
    Tail {
        /// The log file to read.
        #[arg(long, default_value = "waypoint-audit.jsonl")]
        log: PathBuf,
        /// How many records to show.
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
}

pub fn execute(cmd: &AuditCommands, path: &Path) -> anyhow::Result<()> {
    match cmd {
        AuditCommands::Export { out } => {
            let graph = load_graph(path)?;
            let mut log = AuditLog::open(out)?;
            let written = log.export_graph(&graph)?;
            println!("wrote {} records to {}", written, out.display());
        }
        AuditCommands::Tail { log, count } => {
            let records = AuditLog::read_all(log)?;
            let start = records.len().saturating_sub(*count);
            for record in &records[start..] {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }
    Ok(())
}
