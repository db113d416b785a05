// resolver.rs — StatusResolver: blocked/pending derivation and cycle detection.
//
// `blocked_by` is always recomputable from the single source of truth
// (`dependencies`), so the resolver rebuilds it on every pass instead of
// maintaining it incrementally. A dependency id that does not exist in
// the graph counts as not-complete: forward references stay blocking
// until the goal appears and completes.
//
// Cycle detection is a separate on-demand query, not part of the hot
// path. Cycles are surfaced for remediation, never auto-broken — a graph
// with a cycle simply leaves the cyclic goals permanently blocked.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use crate::goal::GoalStatus;
use crate::graph::GoalGraph;

/// Recomputes each goal's blocked/pending transition from its
/// dependency set's completion state.
#[derive(Debug, Default)]
pub struct StatusResolver;

impl StatusResolver {
    pub fn new() -> Self {
        Self
    }

    /// One full pass: rebuild every goal's `blocked_by` and toggle
    /// pending/blocked accordingly. Terminal goals keep their state but
    /// still get a fresh `blocked_by` (it feeds the bottleneck boost and
    /// `explain_goal`). Returns the number of status transitions made.
    pub fn resolve(&self, graph: &GoalGraph) -> usize {
        let mut inner = graph.lock();

        // Completion set first, so the per-goal rebuild is one lookup.
        let complete: HashSet<Uuid> = inner
            .goals
            .values()
            .filter(|g| g.status == GoalStatus::Complete)
            .map(|g| g.id)
            .collect();

        let now = Utc::now();
        let mut transitions = 0;
        for goal in inner.goals.values_mut() {
            goal.blocked_by = goal
                .dependencies
                .iter()
                .filter(|dep| !complete.contains(dep))
                .copied()
                .collect::<BTreeSet<Uuid>>();

            if goal.status == GoalStatus::Pending && goal.is_blocked() {
                goal.status = GoalStatus::Blocked;
                goal.last_state_change = now;
                transitions += 1;
            } else if goal.status == GoalStatus::Blocked && !goal.is_blocked() {
                goal.status = GoalStatus::Pending;
                goal.last_state_change = now;
                transitions += 1;
            }
        }
        transitions
    }

    /// Find every dependency cycle via iterative depth-first traversal.
    /// Each cycle is reported as the id path from the
    /// re-entered node back to the edge that closed the loop. Read-only:
    /// a scheduler that never calls this will happily run with cyclic
    /// goals staying blocked forever.
    pub fn detect_cycles(&self, graph: &GoalGraph) -> Vec<Vec<Uuid>> {
        let inner = graph.lock();
        let deps: HashMap<Uuid, Vec<Uuid>> = inner
            .goals
            .values()
            .map(|g| {
                (
                    g.id,
                    g.dependencies
                        .iter()
                        // Edges to goals not in the graph cannot close a cycle.
                        .filter(|d| inner.goals.contains_key(d))
                        .copied()
                        .collect(),
                )
            })
            .collect();
        drop(inner);

        let mut cycles = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<Uuid> = Vec::new();
        let mut on_stack = HashSet::new();
        // Explicit DFS frames (node, next edge index) keep the traversal
        // depth off the call stack; dependency chains can run arbitrarily
        // deep.
        let mut frames: Vec<(Uuid, usize)> = Vec::new();

        // Starting from every unvisited node guarantees disjoint cycles
        // are all found.
        for &start in deps.keys() {
            if visited.contains(&start) {
                continue;
            }
            visited.insert(start);
            stack.push(start);
            on_stack.insert(start);
            frames.push((start, 0));

            while let Some(frame) = frames.last_mut() {
                let node = frame.0;
                let edges = &deps[&node];
                let next = if frame.1 < edges.len() {
                    let dep = edges[frame.1];
                    frame.1 += 1;
                    Some(dep)
                } else {
                    None
                };
                match next {
                    Some(dep) if !visited.contains(&dep) => {
                        visited.insert(dep);
                        stack.push(dep);
                        on_stack.insert(dep);
                        frames.push((dep, 0));
                    }
                    Some(dep) if on_stack.contains(&dep) => {
                        // The slice from the re-entered node to the top of
                        // the stack is one cycle.
                        let from = stack.iter().position(|&n| n == dep).unwrap_or(0);
                        cycles.push(stack[from..].to_vec());
                    }
                    Some(_) => {}
                    None => {
                        frames.pop();
                        stack.pop();
                        on_stack.remove(&node);
                    }
                }
            }
        }
        cycles
    }
}

/// Convenience free function mirroring the resolver method — lets callers
/// query cycles without constructing a resolver.
pub fn detect_cycles(graph: &GoalGraph) -> Vec<Vec<Uuid>> {
    StatusResolver::new().detect_cycles(graph)
}

/// Membership check used by tests and remediation tooling.
pub fn cycle_contains(cycle: &[Uuid], goals: &[Uuid]) -> bool {
    goals.iter().all(|g| cycle.contains(g))
}
