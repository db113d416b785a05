// analytics.rs — Read-only introspection: graph statistics and
// per-goal explanations. Lock-protected queries, no mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::goal::GoalStatus;
use crate::graph::GoalGraph;

/// Aggregate statistics over the whole graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analytics {
    pub total: usize,
    pub pending: usize,
    pub blocked: usize,
    pub active: usize,
    pub complete: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub avg_priority: f64,
    pub avg_risk: f64,
    /// The goal the most other goals are blocked on, if any are.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottleneck: Option<Bottleneck>,
}

/// The goal with the most dependents currently blocked on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bottleneck {
    pub id: Uuid,
    pub description: String,
    pub dependents: usize,
}

/// Human-readable state of one goal plus the reasons it is where it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub id: Uuid,
    pub description: String,
    pub status: GoalStatus,
    pub priority: f64,
    pub progress: f64,
    pub blocked_by: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub resources: Vec<String>,
    /// One line per contributing reason: blocked-by, expired, terminal.
    pub reasons: Vec<String>,
}

impl GoalGraph {
    /// Counts by status, averages, and the current bottleneck goal.
    pub fn analytics(&self) -> Analytics {
        let inner = self.lock();
        let total = inner.goals.len();
        let mut stats = Analytics {
            total,
            pending: 0,
            blocked: 0,
            active: 0,
            complete: 0,
            failed: 0,
            cancelled: 0,
            avg_priority: 0.0,
            avg_risk: 0.0,
            bottleneck: None,
        };

        let mut dependents: std::collections::HashMap<Uuid, usize> =
            std::collections::HashMap::new();
        for goal in inner.goals.values() {
            match goal.status {
                GoalStatus::Pending => stats.pending += 1,
                GoalStatus::Blocked => stats.blocked += 1,
                GoalStatus::Active => stats.active += 1,
                GoalStatus::Complete => stats.complete += 1,
                GoalStatus::Failed => stats.failed += 1,
                GoalStatus::Cancelled => stats.cancelled += 1,
            }
            stats.avg_priority += goal.priority;
            stats.avg_risk += goal.risk;
            for dep in &goal.blocked_by {
                *dependents.entry(*dep).or_insert(0) += 1;
            }
        }
        let denom = total.max(1) as f64;
        stats.avg_priority /= denom;
        stats.avg_risk /= denom;

        stats.bottleneck = dependents
            .into_iter()
            // Deterministic winner under ties.
            .max_by_key(|&(id, count)| (count, id))
            .and_then(|(id, count)| {
                inner.goals.get(&id).map(|g| Bottleneck {
                    id,
                    description: g.description.clone(),
                    dependents: count,
                })
            });
        stats
    }

    /// Explain one goal: current state plus the reasons behind it.
    /// Returns `None` for unknown ids.
    pub fn explain_goal(&self, id: Uuid) -> Option<Explanation> {
        let now = Utc::now();
        let inner = self.lock();
        let goal = inner.goals.get(&id)?;

        let mut reasons = Vec::new();
        if goal.is_blocked() {
            let ids: Vec<String> = goal.blocked_by.iter().map(|d| d.to_string()).collect();
            reasons.push(format!("blocked by: {}", ids.join(", ")));
        }
        if goal.is_expired(now) {
            // Guarded by is_expired, so the expiry is always present here.
            if let Some(expiry) = goal.expiry {
                reasons.push(format!("expired at {}", expiry.to_rfc3339()));
            }
        }
        match goal.status {
            GoalStatus::Complete => reasons.push("marked as complete".to_string()),
            GoalStatus::Failed => reasons.push("marked as failed".to_string()),
            GoalStatus::Cancelled => reasons.push("cancelled".to_string()),
            _ => {}
        }

        Some(Explanation {
            id: goal.id,
            description: goal.description.clone(),
            status: goal.status,
            priority: goal.priority,
            progress: goal.progress,
            blocked_by: goal.blocked_by.iter().copied().collect(),
            expiry: goal.expiry,
            owner: goal.owner.clone(),
            resources: goal.resources.clone(),
            reasons,
        })
    }
}
