// cycles.rs — Dependency cycle report.

use std::path::Path;

use waypoint_graph::detect_cycles;

use super::load_graph;

pub fn execute(path: &Path) -> anyhow::Result<()> {
    let graph = load_graph(path)?;
    let cycles = detect_cycles(&graph);

    if cycles.is_empty() {
        println!("no dependency cycles");
        return Ok(());
    }

    println!("{} dependency cycle(s):", cycles.len());
    for cycle in &cycles {
        let members: Vec<String> = cycle
            .iter()
            .map(|id| match graph.goal(*id) {
                Some(goal) => format!("{} ({})", id, goal.description),
                None => id.to_string(),
            })
            .collect();
        println!("  {}", members.join(" -> "));
    }
    Ok(())
}
