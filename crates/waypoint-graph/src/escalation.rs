// escalation.rs — EscalationMonitor: risk/priority threshold alerts.
//
// A goal escalates when its risk or priority crosses the configured
// threshold. Checked at creation, on risk mutations, and once per tick
// (the tick sweep also catches priority crossings caused by the
// scheduler's own boosts). Whether a goal re-alerts on every tick while
// it stays over threshold is configurable; the default re-alerts, which
// is the historical behavior.

use std::collections::HashSet;
use std::sync::Mutex;

use uuid::Uuid;

use crate::events::{GraphEvent, GraphEventKind};
use crate::goal::Goal;
use crate::graph::GoalGraph;

/// Escalation thresholds and re-notification policy.
#[derive(Debug, Clone)]
pub struct EscalationConfig {
    /// Risk at or above this escalates.
    pub risk_threshold: f64,
    /// Priority at or above this escalates.
    pub priority_threshold: f64,
    /// When true, a goal over threshold notifies on every check; when
    /// false, only a fresh crossing notifies (re-arming once the goal
    /// drops back under).
    pub renotify_every_tick: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            risk_threshold: 0.7,
            priority_threshold: 2.0,
            renotify_every_tick: true,
        }
    }
}

/// A pending owner notification for an escalation that fired. Produced
/// under the graph lock, delivered by the caller once it is released so
/// a slow notifier sink never stalls other graph users.
pub(crate) struct EscalationNotice {
    pub(crate) owner: Option<String>,
    pub(crate) message: String,
}

/// Watches goals for risk/priority threshold crossings and emits
/// notifications through the observer sinks.
pub struct EscalationMonitor {
    config: EscalationConfig,
    /// Ids currently over threshold — drives the debounced mode.
    over: Mutex<HashSet<Uuid>>,
}

impl EscalationMonitor {
    pub fn new(config: EscalationConfig) -> Self {
        Self {
            config,
            over: Mutex::new(HashSet::new()),
        }
    }

    fn over_lock(&self) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
        self.over
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Check one goal. On escalation, appends an `escalation` audit
    /// entry to the goal and returns the notice to deliver to its
    /// owner; the caller sends it after dropping the graph lock.
    pub(crate) fn check(&self, goal: &mut Goal) -> Option<EscalationNotice> {
        let crossed = goal.risk >= self.config.risk_threshold
            || goal.priority >= self.config.priority_threshold;

        let mut over = self.over_lock();
        if !crossed {
            over.remove(&goal.id);
            return None;
        }
        let fresh = over.insert(goal.id);
        if !self.config.renotify_every_tick && !fresh {
            return None;
        }
        drop(over);

        let message = format!(
            "escalation: goal '{}' ({}) exceeds risk/priority threshold",
            goal.description, goal.id
        );
        goal.add_audit("escalation", serde_json::json!({ "msg": message }));
        Some(EscalationNotice {
            owner: goal.owner.clone(),
            message,
        })
    }

    /// One sweep over all non-terminal goals; runs once per tick after
    /// reprioritization. Owner notifications go out after the graph lock
    /// is released. Returns the number of escalations fired.
    pub fn sweep(&self, graph: &GoalGraph) -> usize {
        let mut notices = Vec::new();
        let count;
        {
            let mut inner = graph.lock();
            let observers = graph.observers();

            // Terminal and removed goals can never re-cross, so their
            // ids leave the debounce set here.
            self.over_lock()
                .retain(|id| inner.goals.get(id).is_some_and(|g| !g.status.is_terminal()));

            let mut fired = Vec::new();
            let ids: Vec<Uuid> = inner.goals.keys().copied().collect();
            for id in ids {
                let Some(goal) = inner.goals.get_mut(&id) else {
                    continue;
                };
                if goal.status.is_terminal() {
                    continue;
                }
                if let Some(notice) = self.check(goal) {
                    notices.push(notice);
                    fired.push(GraphEvent::with_reason(
                        GraphEventKind::Escalation,
                        id,
                        "tick sweep",
                    ));
                }
            }
            count = fired.len();
            for event in fired {
                observers.audit(&event);
                inner.events.push(event);
            }
        }

        let observers = graph.observers();
        for notice in notices {
            if let Some(owner) = &notice.owner {
                observers.notify(owner, &notice.message);
            }
        }
        if count > 0 {
            observers.metric("escalations", count as f64);
        }
        count
    }
}
