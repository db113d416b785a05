// stats.rs — Graph-wide analytics.

use std::path::Path;

use super::load_graph;

pub fn execute(path: &Path) -> anyhow::Result<()> {
    let graph = load_graph(path)?;
    let stats = graph.analytics();

    println!("goals:     {}", stats.total);
    println!("  pending:   {}", stats.pending);
    println!("  blocked:   {}", stats.blocked);
    println!("  active:    {}", stats.active);
    println!("  complete:  {}", stats.complete);
    println!("  failed:    {}", stats.failed);
    println!("  cancelled: {}", stats.cancelled);
    println!("avg priority: {:.2}", stats.avg_priority);
    println!("avg risk:     {:.2}", stats.avg_risk);
    match stats.bottleneck {
        Some(b) => println!(
            "bottleneck: {} \"{}\" ({} goals blocked on it)",
            b.id, b.description, b.dependents
        ),
        None => println!("bottleneck: none"),
    }
    Ok(())
}
