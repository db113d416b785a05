// watch.rs — Run the execution loop over the snapshot file.
//
// Ticks are driven from the main thread rather than the background
// worker so the snapshot can be rewritten after every tick; a kill
// then loses at most one tick of changes.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use waypoint_graph::{Goal, GoalGraph};
use waypoint_runtime::{ExecutionLoop, LoopConfig};

use super::{load_graph, save_graph};

pub fn execute(path: &Path, interval_ms: u64, ticks: u64) -> anyhow::Result<()> {
    let graph = Arc::new(load_graph(path)?);
    let config = LoopConfig {
        tick_interval_ms: interval_ms,
        ..LoopConfig::default()
    };
    let interval = config.tick_interval();

    let exec = ExecutionLoop::new(Arc::clone(&graph), config);
    exec.register_hook("announce", |goal: &Goal| {
        tracing::info!(goal_id = %goal.id, priority = goal.priority, "ready: {}", goal.description);
        Ok(())
    });

    tracing::info!(interval_ms, "watching {}", path.display());
    let mut done = 0u64;
    loop {
        exec.run_once();
        save_and_report(&graph, path)?;
        done += 1;
        if ticks > 0 && done >= ticks {
            return Ok(());
        }
        thread::sleep(interval);
    }
}

fn save_and_report(graph: &GoalGraph, path: &Path) -> anyhow::Result<()> {
    save_graph(graph, path)?;
    let stats = graph.analytics();
    tracing::debug!(
        pending = stats.pending,
        blocked = stats.blocked,
        complete = stats.complete,
        "snapshot saved"
    );
    Ok(())
}
