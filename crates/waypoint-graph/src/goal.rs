// goal.rs — Goal: the schedulable unit of work.
//
// A Goal is pure data plus small validity predicates. It carries identity,
// description, derived execution status, priority, the relation sets
// (dependencies / subgoals / links), informational risk inputs, and an
// append-only audit trail. All concurrency lives in the GoalGraph that
// owns these records — callers only ever see copies.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The execution state of a goal.
///
/// `Pending` means ready to dispatch; `Blocked` means at least one
/// dependency is not complete. `Complete`, `Failed`, and `Cancelled` are
/// terminal: once reached, no further transition is permitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Unblocked and eligible for dispatch on the next tick.
    Pending,

    /// At least one dependency has not reached `Complete`.
    Blocked,

    /// Explicitly marked in-flight by an external driver. The scheduler
    /// itself never assigns this state; it is accepted on import for
    /// compatibility with externally-maintained graphs.
    Active,

    /// Finished successfully.
    Complete,

    /// A handler or operator marked the goal failed.
    Failed,

    /// Cancelled by an operator or by the expiry sweep.
    Cancelled,
}

impl GoalStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GoalStatus::Complete | GoalStatus::Failed | GoalStatus::Cancelled
        )
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Pending => write!(f, "pending"),
            GoalStatus::Blocked => write!(f, "blocked"),
            GoalStatus::Active => write!(f, "active"),
            GoalStatus::Complete => write!(f, "complete"),
            GoalStatus::Failed => write!(f, "failed"),
            GoalStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One entry in a goal's append-only audit trail.
///
/// Every mutating operation appends exactly one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the mutation happened (UTC).
    pub timestamp: DateTime<Utc>,

    /// Short machine-readable event name (e.g. "completed", "hook_failed").
    pub event: String,

    /// Arbitrary event details. `serde_json::Value` can hold any JSON.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

/// Creation parameters for a new goal.
///
/// A request struct instead of a long parameter list — everything except
/// the description has a sensible default, and call sites stay readable.
#[derive(Debug, Clone)]
pub struct AddGoal {
    pub description: String,
    pub priority: f64,
    /// Deadline used for priority pressure and ready-list ordering.
    pub deadline: Option<DateTime<Utc>>,
    /// Expiry after which a pending/blocked goal is auto-cancelled.
    pub expiry: Option<DateTime<Utc>>,
    pub dependencies: Vec<Uuid>,
    pub owner: Option<String>,
    pub resources: Vec<String>,
    pub tags: Vec<String>,
    pub risk: f64,
    pub uncertainty: f64,
}

impl AddGoal {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            priority: 1.0,
            deadline: None,
            expiry: None,
            dependencies: Vec::new(),
            owner: None,
            resources: Vec::new(),
            tags: Vec::new(),
            risk: 0.0,
            uncertainty: 0.0,
        }
    }

    pub fn priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn depends_on(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.dependencies.extend(ids);
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn risk(mut self, risk: f64) -> Self {
        self.risk = risk;
        self
    }

    pub fn uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = uncertainty;
        self
    }
}

/// A single unit of work tracked by the goal graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier, assigned at creation, immutable.
    pub id: Uuid,

    /// Free-text description. Immutable after creation — edits create
    /// audit entries, never new identity.
    pub description: String,

    /// Current execution state. Derived for Pending/Blocked; terminals
    /// are set by explicit mutations.
    pub status: GoalStatus,

    /// Urgency. Higher is more urgent; recomputed every tick.
    pub priority: f64,

    /// Completion fraction in 0.0..=1.0.
    #[serde(default)]
    pub progress: f64,

    /// When this goal was created.
    pub created: DateTime<Utc>,

    /// When this goal was last mutated.
    pub updated: DateTime<Utc>,

    /// When `status` last changed.
    pub last_state_change: DateTime<Utc>,

    /// Deadline driving priority pressure and ready-list ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,

    /// When passed while pending/blocked, the goal is auto-cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,

    /// Goals that must reach `Complete` before this one may leave
    /// `Blocked`. May reference ids not yet present in the graph.
    #[serde(default)]
    pub dependencies: BTreeSet<Uuid>,

    /// Goals spawned from this one (reverse side of `dependencies`).
    #[serde(default)]
    pub subgoals: BTreeSet<Uuid>,

    /// Derived: the subset of `dependencies` not yet complete.
    /// Recomputed by the status resolver, never hand-edited.
    #[serde(default)]
    pub blocked_by: BTreeSet<Uuid>,

    /// Related-but-not-dependent goals. Pure annotation.
    #[serde(default)]
    pub links: BTreeSet<Uuid>,

    /// Risk estimate in 0.0..=1.0 — escalation input.
    #[serde(default)]
    pub risk: f64,

    /// Accumulated reward from feedback.
    #[serde(default)]
    pub reward: f64,

    /// Uncertainty estimate in 0.0..=1.0 — ordering tie-break input.
    #[serde(default)]
    pub uncertainty: f64,

    /// Identity string for notification routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Opaque resource tags. Advisory only — no allocation logic.
    #[serde(default)]
    pub resources: Vec<String>,

    /// Free-form labels. Annotation only.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Arbitrary key/value context, merged by `set_context`.
    #[serde(default)]
    pub context: serde_json::Map<String, Value>,

    /// Append-only audit trail.
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
}

impl Goal {
    /// Create a new pending goal from a request. The dependency set is
    /// seeded here; blocked/pending derivation happens in the graph.
    pub fn new(req: AddGoal) -> Self {
        let now = Utc::now();
        let mut goal = Self {
            id: Uuid::new_v4(),
            description: req.description,
            status: GoalStatus::Pending,
            priority: req.priority,
            progress: 0.0,
            created: now,
            updated: now,
            last_state_change: now,
            deadline: req.deadline,
            expiry: req.expiry,
            dependencies: BTreeSet::new(),
            subgoals: BTreeSet::new(),
            blocked_by: BTreeSet::new(),
            links: BTreeSet::new(),
            risk: req.risk,
            reward: 0.0,
            uncertainty: req.uncertainty,
            owner: req.owner,
            resources: req.resources,
            tags: req.tags,
            context: serde_json::Map::new(),
            audit: Vec::new(),
        };
        for dep in req.dependencies {
            goal.add_dependency(dep);
        }
        goal
    }

    /// Append one audit entry and stamp `updated`.
    pub fn add_audit(&mut self, event: impl Into<String>, details: Value) {
        let now = Utc::now();
        self.updated = now;
        self.audit.push(AuditEntry {
            timestamp: now,
            event: event.into(),
            details,
        });
    }

    pub fn add_dependency(&mut self, dep: Uuid) {
        if self.dependencies.insert(dep) {
            self.add_audit("dependency_added", serde_json::json!({ "goal_id": dep }));
        }
    }

    pub fn add_subgoal(&mut self, sub: Uuid) {
        if self.subgoals.insert(sub) {
            self.add_audit("subgoal_added", serde_json::json!({ "goal_id": sub }));
        }
    }

    pub fn link_to(&mut self, other: Uuid) {
        if self.links.insert(other) {
            self.add_audit("linked", serde_json::json!({ "to": other }));
        }
    }

    /// Assign an advisory resource tag. Idempotent per resource.
    pub fn assign_resource(&mut self, resource: &str) {
        if !self.resources.iter().any(|r| r == resource) {
            self.resources.push(resource.to_string());
            self.add_audit("resource_assigned", serde_json::json!({ "resource": resource }));
        }
    }

    /// Set completion fraction, clamped to 0.0..=1.0.
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
        self.add_audit("progress", serde_json::json!({ "progress": self.progress }));
    }

    pub fn set_risk(&mut self, risk: f64) {
        self.risk = risk;
        self.add_audit("risk_updated", serde_json::json!({ "risk": risk }));
    }

    pub fn set_uncertainty(&mut self, uncertainty: f64) {
        self.uncertainty = uncertainty;
        self.add_audit(
            "uncertainty_updated",
            serde_json::json!({ "uncertainty": uncertainty }),
        );
    }

    /// Merge key/value pairs into the goal's context.
    pub fn set_context(&mut self, context: serde_json::Map<String, Value>) {
        let keys: Vec<String> = context.keys().cloned().collect();
        let details = serde_json::json!({ "keys": keys });
        for (k, v) in context {
            self.context.insert(k, v);
        }
        self.add_audit("context_updated", details);
    }

    /// Record feedback text and accumulate its reward delta.
    pub fn give_feedback(&mut self, feedback: &str, reward: f64) {
        self.reward += reward;
        self.add_audit(
            "feedback",
            serde_json::json!({ "feedback": feedback, "reward": reward }),
        );
    }

    /// Transition to `Complete`. Caller must check terminality first.
    pub fn mark_complete(&mut self, feedback: Option<&str>) {
        self.status = GoalStatus::Complete;
        self.progress = 1.0;
        self.last_state_change = Utc::now();
        let details = match feedback {
            Some(fb) => serde_json::json!({ "feedback": fb }),
            None => Value::Null,
        };
        self.add_audit("completed", details);
    }

    /// Transition to `Failed`. Caller must check terminality first.
    pub fn mark_failed(&mut self, reason: &str) {
        self.status = GoalStatus::Failed;
        self.last_state_change = Utc::now();
        self.add_audit("failed", serde_json::json!({ "reason": reason }));
    }

    /// Transition to `Cancelled`. Caller must check terminality first.
    pub fn mark_cancelled(&mut self, reason: &str) {
        self.status = GoalStatus::Cancelled;
        self.last_state_change = Utc::now();
        self.add_audit("cancelled", serde_json::json!({ "reason": reason }));
    }

    /// Whether the expiry timestamp (if any) has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|e| now > e)
    }

    /// Whether any dependency is still outstanding (per the last resolver pass).
    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }

    /// Whether the deadline falls within the given window from `now`.
    /// Overdue deadlines count as within the window.
    pub fn deadline_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.deadline.is_some_and(|d| d - now <= window)
    }

    /// Ready for dispatch: pending, unblocked, not expired.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.status == GoalStatus::Pending && !self.is_blocked() && !self.is_expired(now)
    }
}
