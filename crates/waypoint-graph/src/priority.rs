// priority.rs — PriorityScheduler: deterministic priority policy and
// ready-list ordering.
//
// The policy is re-applied every tick over all goals:
//   - near-deadline pressure: flat boost while the deadline is inside
//     the configured window (overdue counts as inside)
//   - bottleneck boost: proportional to how many goals are currently
//     blocked on this one
//   - completion decay: completed goals lose priority each tick so the
//     history does not crowd out active work in ranking views
//
// Ready-list ordering is a strict total order: descending priority, then
// ascending deadline (absent sorts last), progress, risk, uncertainty,
// and finally ascending id so no two distinct goals ever compare equal.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::goal::{Goal, GoalStatus};
use crate::graph::GoalGraph;

/// Tunables for the priority policy.
#[derive(Debug, Clone)]
pub struct PriorityConfig {
    /// Window before the deadline in which the boost applies.
    pub near_deadline_window: Duration,
    /// Flat boost added while inside the window.
    pub deadline_boost: f64,
    /// Boost per goal currently blocked on this one.
    pub dependent_boost: f64,
    /// Per-tick multiplier applied to completed goals (< 1).
    pub completion_decay: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            near_deadline_window: Duration::hours(1),
            deadline_boost: 0.2,
            dependent_boost: 0.1,
            completion_decay: 0.95,
        }
    }
}

/// Periodically recomputes goal priority and orders the ready list.
#[derive(Debug, Default)]
pub struct PriorityScheduler {
    config: PriorityConfig,
}

impl PriorityScheduler {
    pub fn new(config: PriorityConfig) -> Self {
        Self { config }
    }

    /// One reprioritization pass over the whole graph.
    pub fn reprioritize(&self, graph: &GoalGraph) {
        let now = Utc::now();
        let mut inner = graph.lock();

        // Reverse index: how many goals are blocked on each id.
        let mut dependents: HashMap<Uuid, usize> = HashMap::new();
        for goal in inner.goals.values() {
            for dep in &goal.blocked_by {
                *dependents.entry(*dep).or_insert(0) += 1;
            }
        }

        for goal in inner.goals.values_mut() {
            match goal.status {
                GoalStatus::Pending | GoalStatus::Blocked | GoalStatus::Active => {
                    if goal.deadline_within(now, self.config.near_deadline_window) {
                        goal.priority += self.config.deadline_boost;
                    }
                    let blocked_on_this = dependents.get(&goal.id).copied().unwrap_or(0);
                    if blocked_on_this > 0 {
                        goal.priority += self.config.dependent_boost * blocked_on_this as f64;
                    }
                }
                GoalStatus::Complete => {
                    goal.priority *= self.config.completion_decay;
                }
                GoalStatus::Failed | GoalStatus::Cancelled => {}
            }
        }
    }

    /// Ready goals in dispatch order: a consistent snapshot, sorted.
    pub fn ready_list(&self, graph: &GoalGraph) -> Vec<Goal> {
        let mut ready = graph.active_goals();
        sort_ready(&mut ready);
        ready
    }
}

/// Sort goals into dispatch order (see module docs for the key).
pub fn sort_ready(goals: &mut [Goal]) {
    goals.sort_by(ready_order);
}

/// The strict total ready ordering.
pub fn ready_order(a: &Goal, b: &Goal) -> Ordering {
    b.priority
        .total_cmp(&a.priority)
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(da), Some(db)) => da.cmp(&db),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.progress.total_cmp(&b.progress))
        .then_with(|| a.risk.total_cmp(&b.risk))
        .then_with(|| a.uncertainty.total_cmp(&b.uncertainty))
        .then_with(|| a.id.cmp(&b.id))
}
