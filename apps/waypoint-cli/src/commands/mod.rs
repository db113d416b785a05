// mod.rs — CLI subcommand modules.

pub mod audit;
pub mod cycles;
pub mod goal;
pub mod stats;
pub mod watch;

use std::path::Path;

use waypoint_graph::GoalGraph;

/// Load the graph from the snapshot file, or start empty if the file
/// does not exist yet.
pub fn load_graph(path: &Path) -> anyhow::Result<GoalGraph> {
    let graph = GoalGraph::new();
    if path.exists() {
        graph.load_from(path)?;
    }
    Ok(graph)
}

/// Persist the graph back to the snapshot file.
pub fn save_graph(graph: &GoalGraph, path: &Path) -> anyhow::Result<()> {
    graph.save_to(path)?;
    Ok(())
}
