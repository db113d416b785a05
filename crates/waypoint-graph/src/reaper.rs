// reaper.rs — ExpiryReaper: auto-cancel goals whose expiry has passed.

use chrono::Utc;
use uuid::Uuid;

use crate::goal::GoalStatus;
use crate::graph::GoalGraph;

/// Sweeps pending/blocked goals whose expiry timestamp has passed and
/// cancels them with reason `"expired (auto-decay)"`. Terminal goals are
/// never touched, even when they carry an expiry.
#[derive(Debug, Default)]
pub struct ExpiryReaper;

impl ExpiryReaper {
    pub fn new() -> Self {
        Self
    }

    /// One sweep. Returns the number of goals cancelled.
    pub fn sweep(&self, graph: &GoalGraph) -> usize {
        let now = Utc::now();
        // Collect under the lock, expire after releasing it — expiry
        // notifies owners through observer sinks.
        let expired: Vec<Uuid> = {
            let inner = graph.lock();
            inner
                .goals
                .values()
                .filter(|g| {
                    matches!(g.status, GoalStatus::Pending | GoalStatus::Blocked)
                        && g.is_expired(now)
                })
                .map(|g| g.id)
                .collect()
        };

        let mut cancelled = 0;
        for id in expired {
            // Re-checked inside: a goal completed between the two locks
            // is left alone.
            if graph.expire_goal(id) {
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            tracing::info!(cancelled, "expiry sweep cancelled goals");
        }
        cancelled
    }
}
