// graph.rs — GoalGraph: the arena store that owns every goal.
//
// All goals live in one id-keyed map behind a single exclusive lock.
// Mutations acquire the lock for the duration of the structural change;
// read queries take a consistent snapshot under the same lock and return
// copies, so callers never observe concurrent mutation. Critical sections
// stay small — hook execution and observer delivery happen outside them
// wherever a sink could be slow.
//
// Unknown ids and terminal goals are reported through boolean returns,
// never errors. The two no-op cases are distinguished at debug level so
// operators can tell them apart without an API break.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::error::GraphError;
use crate::escalation::{EscalationConfig, EscalationMonitor, EscalationNotice};
use crate::events::{GraphEvent, GraphEventKind, Observers};
use crate::goal::{AddGoal, Goal, GoalStatus};
use crate::snapshot::GraphSnapshot;

/// Reward policy applied when a goal completes: given the completed goal,
/// produce a reward delta to accumulate on it.
pub type RewardFn = Box<dyn Fn(&Goal) -> f64 + Send + Sync>;

/// Lock-protected graph state: the goal arena, insertion-order history
/// (drives `undo_last`), and the graph-level event log.
pub(crate) struct GraphInner {
    pub(crate) goals: HashMap<Uuid, Goal>,
    pub(crate) history: Vec<Uuid>,
    pub(crate) events: Vec<GraphEvent>,
}

/// The dependency-aware goal store.
///
/// Exclusively owns all [`Goal`] instances; callers only ever receive
/// copies. Safe to share across threads behind an `Arc`.
pub struct GoalGraph {
    inner: Mutex<GraphInner>,
    observers: Observers,
    escalation: EscalationMonitor,
    reward_fn: Option<RewardFn>,
}

impl Default for GoalGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalGraph {
    /// Create an empty graph with default escalation thresholds and no
    /// observer sinks.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GraphInner {
                goals: HashMap::new(),
                history: Vec::new(),
                events: Vec::new(),
            }),
            observers: Observers::new(),
            escalation: EscalationMonitor::new(EscalationConfig::default()),
            reward_fn: None,
        }
    }

    /// Inject the observer sinks. Set once at construction.
    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    /// Override the escalation thresholds.
    pub fn with_escalation(mut self, config: EscalationConfig) -> Self {
        self.escalation = EscalationMonitor::new(config);
        self
    }

    /// Register a reward policy applied on completion.
    pub fn with_reward_fn(
        mut self,
        reward_fn: impl Fn(&Goal) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.reward_fn = Some(Box::new(reward_fn));
        self
    }

    /// The observer dispatcher (used by the scheduling passes).
    pub(crate) fn observers(&self) -> &Observers {
        &self.observers
    }

    /// Acquire the graph lock. A poisoned lock is recovered rather than
    /// propagated — a panicking hook must not take the whole graph down.
    pub(crate) fn lock(&self) -> MutexGuard<'_, GraphInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send an escalation notice to its owner. Must be called with the
    /// graph lock released; notifier sinks run arbitrary user code.
    fn deliver(&self, notice: Option<EscalationNotice>) {
        if let Some(notice) = notice {
            if let Some(owner) = &notice.owner {
                self.observers.notify(owner, &notice.message);
            }
        }
    }

    // ------------------------- mutations ---------------------------

    /// Add a goal to the graph. Always succeeds and returns the new id.
    ///
    /// Dependencies may reference ids not yet present (forward references
    /// are legal); present dependencies get the reverse subgoal link
    /// wired immediately. The initial blocked/pending state is derived
    /// here so the blocking invariant holds from the moment of insertion.
    pub fn add_goal(&self, req: AddGoal) -> Uuid {
        let mut goal = Goal::new(req);
        let id = goal.id;

        let mut inner = self.lock();
        for dep in goal.dependencies.clone() {
            // Missing dependencies count as not-complete.
            let dep_complete = inner
                .goals
                .get(&dep)
                .is_some_and(|d| d.status == GoalStatus::Complete);
            if !dep_complete {
                goal.blocked_by.insert(dep);
            }
            if let Some(parent) = inner.goals.get_mut(&dep) {
                parent.add_subgoal(id);
            }
        }
        if goal.is_blocked() {
            goal.status = GoalStatus::Blocked;
        }
        goal.add_audit("added", serde_json::Value::Null);

        let notice = self.escalation.check(&mut goal);
        if notice.is_some() {
            let event =
                GraphEvent::with_reason(GraphEventKind::Escalation, id, "created over threshold");
            self.record(&mut inner, event);
        }

        inner.goals.insert(id, goal);
        inner.history.push(id);
        let event = GraphEvent::new(GraphEventKind::GoalAdded, id);
        self.record(&mut inner, event);
        drop(inner);

        self.deliver(notice);
        self.observers.metric("goals.added", 1.0);
        id
    }

    /// Create a goal as a subgoal of `parent`: the parent becomes a
    /// dependency of the child, and the child appears in the parent's
    /// subgoal set. Returns `None` when the parent is unknown.
    pub fn add_subgoal(&self, parent: Uuid, mut req: AddGoal) -> Option<Uuid> {
        if !self.lock().goals.contains_key(&parent) {
            tracing::debug!(%parent, "add_subgoal: unknown parent");
            return None;
        }
        req.dependencies.push(parent);
        Some(self.add_goal(req))
    }

    /// Mark a goal complete. Returns `false` for unknown ids and goals
    /// already in a terminal state (idempotent no-op).
    pub fn complete_goal(&self, id: Uuid, feedback: Option<&str>) -> bool {
        let mut inner = self.lock();
        let Some(goal) = inner.goals.get_mut(&id) else {
            tracing::debug!(%id, "complete_goal: unknown goal");
            return false;
        };
        if goal.status.is_terminal() {
            tracing::debug!(%id, status = %goal.status, "complete_goal: already terminal");
            return false;
        }
        goal.mark_complete(feedback);
        if let Some(reward_fn) = &self.reward_fn {
            let delta = reward_fn(goal);
            goal.give_feedback(feedback.unwrap_or("auto"), delta);
        }
        let event = GraphEvent::new(GraphEventKind::GoalCompleted, id);
        self.record(&mut inner, event);
        drop(inner);
        self.observers.metric("goals.completed", 1.0);
        true
    }

    /// Mark a goal failed. Same no-op contract as [`complete_goal`].
    ///
    /// [`complete_goal`]: GoalGraph::complete_goal
    pub fn fail_goal(&self, id: Uuid, reason: &str) -> bool {
        let mut inner = self.lock();
        let Some(goal) = inner.goals.get_mut(&id) else {
            tracing::debug!(%id, "fail_goal: unknown goal");
            return false;
        };
        if goal.status.is_terminal() {
            tracing::debug!(%id, status = %goal.status, "fail_goal: already terminal");
            return false;
        }
        goal.mark_failed(reason);
        let event = GraphEvent::with_reason(GraphEventKind::GoalFailed, id, reason);
        self.record(&mut inner, event);
        drop(inner);
        self.observers.metric("goals.failed", 1.0);
        true
    }

    /// Cancel a goal. Same no-op contract as [`complete_goal`].
    ///
    /// [`complete_goal`]: GoalGraph::complete_goal
    pub fn cancel_goal(&self, id: Uuid, reason: &str) -> bool {
        let mut inner = self.lock();
        let Some(goal) = inner.goals.get_mut(&id) else {
            tracing::debug!(%id, "cancel_goal: unknown goal");
            return false;
        };
        if goal.status.is_terminal() {
            tracing::debug!(%id, status = %goal.status, "cancel_goal: already terminal");
            return false;
        }
        goal.mark_cancelled(reason);
        let event = GraphEvent::with_reason(GraphEventKind::GoalCancelled, id, reason);
        self.record(&mut inner, event);
        drop(inner);
        self.observers.metric("goals.cancelled", 1.0);
        true
    }

    /// Expire a pending/blocked goal: cancel it and notify the owner.
    /// Used by the expiry sweep; terminal goals are never touched.
    pub(crate) fn expire_goal(&self, id: Uuid) -> bool {
        let reason = "expired (auto-decay)";
        let mut inner = self.lock();
        let Some(goal) = inner.goals.get_mut(&id) else {
            return false;
        };
        if goal.status.is_terminal() {
            return false;
        }
        goal.mark_cancelled(reason);
        let owner = goal.owner.clone();
        let message = format!("goal '{}' expired and was cancelled", goal.description);
        let event = GraphEvent::with_reason(GraphEventKind::GoalExpired, id, reason);
        self.record(&mut inner, event);
        drop(inner);
        if let Some(owner) = owner {
            self.observers.notify(&owner, &message);
        }
        self.observers.metric("goals.expired", 1.0);
        true
    }

    /// Record a hook failure against a goal and fail it. The hook name
    /// and error text land in the goal's audit trail; other goals in the
    /// same tick are unaffected.
    pub fn record_hook_failure(&self, id: Uuid, hook: &str, error: &str) -> bool {
        {
            let mut inner = self.lock();
            let Some(goal) = inner.goals.get_mut(&id) else {
                return false;
            };
            goal.add_audit(
                "hook_failed",
                serde_json::json!({ "hook": hook, "error": error }),
            );
            let event = GraphEvent::with_reason(
                GraphEventKind::HookFailed,
                id,
                format!("{hook}: {error}"),
            );
            self.record(&mut inner, event);
        }
        self.fail_goal(id, &format!("{hook} failed: {error}"))
    }

    /// Set completion fraction. Returns `false` for unknown ids.
    pub fn set_progress(&self, id: Uuid, progress: f64) -> bool {
        self.with_goal_mut(id, |goal| goal.set_progress(progress))
    }

    /// Set the risk estimate and re-evaluate escalation thresholds.
    pub fn set_risk(&self, id: Uuid, risk: f64) -> bool {
        let notice = {
            let mut inner = self.lock();
            let Some(goal) = inner.goals.get_mut(&id) else {
                return false;
            };
            goal.set_risk(risk);
            let notice = self.escalation.check(goal);
            if notice.is_some() {
                let event = GraphEvent::with_reason(GraphEventKind::Escalation, id, "risk updated");
                self.record(&mut inner, event);
            }
            notice
        };
        self.deliver(notice);
        true
    }

    pub fn set_uncertainty(&self, id: Uuid, uncertainty: f64) -> bool {
        self.with_goal_mut(id, |goal| goal.set_uncertainty(uncertainty))
    }

    /// Merge key/value pairs into a goal's context.
    pub fn set_context(&self, id: Uuid, context: serde_json::Map<String, serde_json::Value>) -> bool {
        self.with_goal_mut(id, |goal| goal.set_context(context))
    }

    /// Assign an advisory resource tag (idempotent per resource).
    pub fn assign_resource(&self, id: Uuid, resource: &str) -> bool {
        self.with_goal_mut(id, |goal| goal.assign_resource(resource))
    }

    /// Record feedback text and accumulate its reward delta.
    pub fn give_feedback(&self, id: Uuid, feedback: &str, reward: f64) -> bool {
        self.with_goal_mut(id, |goal| goal.give_feedback(feedback, reward))
    }

    /// Annotate a goal as related to another. No scheduling effect.
    pub fn link_to(&self, id: Uuid, other: Uuid) -> bool {
        self.with_goal_mut(id, |goal| goal.link_to(other))
    }

    /// Remove and return the most recently created goal, regardless of
    /// its current status. Operator correction, not general deletion.
    pub fn undo_last(&self) -> Option<Goal> {
        let mut inner = self.lock();
        let last_id = inner.history.pop()?;
        let mut goal = inner.goals.remove(&last_id)?;
        goal.add_audit("undone", serde_json::Value::Null);
        let event = GraphEvent::new(GraphEventKind::GoalUndone, last_id);
        self.record(&mut inner, event);
        Some(goal)
    }

    /// Re-evaluate escalation thresholds over all non-terminal goals.
    /// Run once per tick, after reprioritization. Returns the number of
    /// escalations fired.
    pub fn escalation_sweep(&self) -> usize {
        self.escalation.sweep(self)
    }

    fn with_goal_mut(&self, id: Uuid, mutate: impl FnOnce(&mut Goal)) -> bool {
        let mut inner = self.lock();
        match inner.goals.get_mut(&id) {
            Some(goal) => {
                mutate(goal);
                true
            }
            None => {
                tracing::debug!(%id, "mutation on unknown goal");
                false
            }
        }
    }

    fn record(&self, inner: &mut GraphInner, event: GraphEvent) {
        self.observers.audit(&event);
        inner.events.push(event);
    }

    // -------------------------- queries ----------------------------

    /// A copy of one goal.
    pub fn goal(&self, id: Uuid) -> Option<Goal> {
        self.lock().goals.get(&id).cloned()
    }

    /// First goal whose description matches exactly.
    pub fn find_by_description(&self, description: &str) -> Option<Goal> {
        self.lock()
            .goals
            .values()
            .find(|g| g.description == description)
            .cloned()
    }

    /// Ready goals: pending, unblocked, not expired. Unordered — the
    /// priority scheduler decides dispatch order.
    pub fn active_goals(&self) -> Vec<Goal> {
        let now = chrono::Utc::now();
        self.collect(|g| g.is_ready(now))
    }

    pub fn blocked_goals(&self) -> Vec<Goal> {
        self.collect(|g| g.status == GoalStatus::Blocked)
    }

    pub fn completed_goals(&self) -> Vec<Goal> {
        self.collect(|g| g.status == GoalStatus::Complete)
    }

    pub fn failed_goals(&self) -> Vec<Goal> {
        self.collect(|g| g.status == GoalStatus::Failed)
    }

    pub fn cancelled_goals(&self) -> Vec<Goal> {
        self.collect(|g| g.status == GoalStatus::Cancelled)
    }

    /// Copies of every goal, in insertion order.
    pub fn all_goals(&self) -> Vec<Goal> {
        let inner = self.lock();
        inner
            .history
            .iter()
            .filter_map(|id| inner.goals.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().goals.is_empty()
    }

    /// A copy of the graph-level event log, oldest first.
    pub fn events(&self) -> Vec<GraphEvent> {
        self.lock().events.clone()
    }

    fn collect(&self, keep: impl Fn(&Goal) -> bool) -> Vec<Goal> {
        self.lock().goals.values().filter(|g| keep(g)).cloned().collect()
    }

    // --------------------- persistence surface ---------------------

    /// A structural snapshot of the whole graph.
    pub fn export_graph(&self) -> GraphSnapshot {
        let inner = self.lock();
        GraphSnapshot {
            goals: inner.goals.clone(),
            history: inner.history.clone(),
        }
    }

    /// Replace in-memory state wholesale with a snapshot (not a merge).
    /// The event log is preserved — it describes what already happened.
    pub fn import_graph(&self, snapshot: GraphSnapshot) {
        let mut inner = self.lock();
        inner.goals = snapshot.goals;
        inner.history = snapshot.history;
    }

    /// Write a snapshot to a JSON file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        self.export_graph().save_to(path)
    }

    /// Load a snapshot from a JSON file, replacing in-memory state.
    pub fn load_from(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        let snapshot = GraphSnapshot::load_from(path)?;
        self.import_graph(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::AddGoal;

    #[test]
    fn add_and_get_goal() {
        let graph = GoalGraph::new();
        let id = graph.add_goal(AddGoal::new("write docs").priority(1.2));
        let goal = graph.goal(id).unwrap();
        assert_eq!(goal.description, "write docs");
        assert_eq!(goal.status, GoalStatus::Pending);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn dependent_goal_starts_blocked() {
        let graph = GoalGraph::new();
        let a = graph.add_goal(AddGoal::new("a"));
        let b = graph.add_goal(AddGoal::new("b").depends_on([a]));
        let goal_b = graph.goal(b).unwrap();
        assert_eq!(goal_b.status, GoalStatus::Blocked);
        assert!(goal_b.blocked_by.contains(&a));
        // Reverse subgoal link wired on the dependency.
        assert!(graph.goal(a).unwrap().subgoals.contains(&b));
    }

    #[test]
    fn forward_reference_blocks_until_dependency_exists() {
        let graph = GoalGraph::new();
        let ghost = Uuid::new_v4();
        let id = graph.add_goal(AddGoal::new("needs ghost").depends_on([ghost]));
        assert_eq!(graph.goal(id).unwrap().status, GoalStatus::Blocked);
    }

    #[test]
    fn dependency_on_completed_goal_does_not_block() {
        let graph = GoalGraph::new();
        let a = graph.add_goal(AddGoal::new("a"));
        assert!(graph.complete_goal(a, None));
        let b = graph.add_goal(AddGoal::new("b").depends_on([a]));
        assert_eq!(graph.goal(b).unwrap().status, GoalStatus::Pending);
    }

    #[test]
    fn complete_is_idempotent() {
        let graph = GoalGraph::new();
        let id = graph.add_goal(AddGoal::new("once"));
        assert!(graph.complete_goal(id, Some("done")));

        let before = graph.goal(id).unwrap();
        assert!(!graph.complete_goal(id, Some("again")));
        assert!(!graph.fail_goal(id, "should not apply"));
        assert!(!graph.cancel_goal(id, "should not apply"));

        let after = graph.goal(id).unwrap();
        assert_eq!(after.status, GoalStatus::Complete);
        assert_eq!(after.updated, before.updated);
        assert_eq!(after.audit.len(), before.audit.len());
    }

    #[test]
    fn unknown_id_mutations_return_false() {
        let graph = GoalGraph::new();
        let ghost = Uuid::new_v4();
        assert!(!graph.complete_goal(ghost, None));
        assert!(!graph.fail_goal(ghost, "x"));
        assert!(!graph.cancel_goal(ghost, "x"));
        assert!(!graph.set_progress(ghost, 0.5));
        assert!(!graph.assign_resource(ghost, "r"));
    }

    #[test]
    fn fail_records_reason() {
        let graph = GoalGraph::new();
        let id = graph.add_goal(AddGoal::new("flaky"));
        assert!(graph.fail_goal(id, "could not reproduce"));
        let goal = graph.goal(id).unwrap();
        assert_eq!(goal.status, GoalStatus::Failed);
        let last = goal.audit.last().unwrap();
        assert_eq!(last.event, "failed");
        assert_eq!(last.details["reason"], "could not reproduce");
        let events = graph.events();
        let failed = events
            .iter()
            .find(|e| e.event == GraphEventKind::GoalFailed)
            .unwrap();
        assert_eq!(failed.reason.as_deref(), Some("could not reproduce"));
    }

    #[test]
    fn reward_fn_applies_delta_on_completion() {
        let graph = GoalGraph::new().with_reward_fn(|g| g.priority * 2.0);
        let id = graph.add_goal(AddGoal::new("rewarding").priority(0.5));
        assert!(graph.complete_goal(id, Some("nice")));
        let goal = graph.goal(id).unwrap();
        assert!((goal.reward - 1.0).abs() < 1e-9);
    }

    #[test]
    fn add_subgoal_wires_both_sides() {
        let graph = GoalGraph::new();
        let parent = graph.add_goal(AddGoal::new("report"));
        let child = graph
            .add_subgoal(parent, AddGoal::new("research"))
            .unwrap();
        assert!(graph.goal(child).unwrap().dependencies.contains(&parent));
        assert!(graph.goal(parent).unwrap().subgoals.contains(&child));
        // Child depends on an incomplete parent, so it starts blocked.
        assert_eq!(graph.goal(child).unwrap().status, GoalStatus::Blocked);
    }

    #[test]
    fn add_subgoal_unknown_parent() {
        let graph = GoalGraph::new();
        assert!(graph.add_subgoal(Uuid::new_v4(), AddGoal::new("orphan")).is_none());
        assert!(graph.is_empty());
    }

    #[test]
    fn undo_last_removes_newest_goal() {
        let graph = GoalGraph::new();
        let first = graph.add_goal(AddGoal::new("first"));
        let second = graph.add_goal(AddGoal::new("second"));
        // Status does not matter for undo.
        graph.complete_goal(second, None);

        let undone = graph.undo_last().unwrap();
        assert_eq!(undone.id, second);
        assert!(graph.goal(second).is_none());
        assert!(graph.goal(first).is_some());
        assert_eq!(graph.undo_last().unwrap().id, first);
        assert!(graph.undo_last().is_none());
    }

    #[test]
    fn status_queries_filter_correctly() {
        let graph = GoalGraph::new();
        let a = graph.add_goal(AddGoal::new("a"));
        let b = graph.add_goal(AddGoal::new("b").depends_on([a]));
        let c = graph.add_goal(AddGoal::new("c"));
        let d = graph.add_goal(AddGoal::new("d"));
        graph.complete_goal(c, None);
        graph.fail_goal(d, "no");

        let active: Vec<Uuid> = graph.active_goals().iter().map(|g| g.id).collect();
        assert_eq!(active, vec![a]);
        let blocked: Vec<Uuid> = graph.blocked_goals().iter().map(|g| g.id).collect();
        assert_eq!(blocked, vec![b]);
        assert_eq!(graph.completed_goals().len(), 1);
        assert_eq!(graph.failed_goals().len(), 1);
        assert!(graph.cancelled_goals().is_empty());
    }

    #[test]
    fn expired_goal_is_not_active() {
        let graph = GoalGraph::new();
        graph.add_goal(
            AddGoal::new("stale").expiry(chrono::Utc::now() - chrono::Duration::minutes(5)),
        );
        assert!(graph.active_goals().is_empty());
    }

    #[test]
    fn link_is_one_directional_annotation() {
        let graph = GoalGraph::new();
        let a = graph.add_goal(AddGoal::new("a"));
        let b = graph.add_goal(AddGoal::new("b"));
        assert!(graph.link_to(a, b));
        assert!(graph.goal(a).unwrap().links.contains(&b));
        assert!(graph.goal(b).unwrap().links.is_empty());
        // No scheduling effect.
        assert_eq!(graph.active_goals().len(), 2);
    }

    #[test]
    fn all_goals_in_insertion_order() {
        let graph = GoalGraph::new();
        let ids: Vec<Uuid> = (0..5)
            .map(|i| graph.add_goal(AddGoal::new(format!("goal {i}"))))
            .collect();
        let listed: Vec<Uuid> = graph.all_goals().iter().map(|g| g.id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn find_by_description() {
        let graph = GoalGraph::new();
        let id = graph.add_goal(AddGoal::new("the one"));
        assert_eq!(graph.find_by_description("the one").unwrap().id, id);
        assert!(graph.find_by_description("missing").is_none());
    }
}
