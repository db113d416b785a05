// full_cycle.rs — End-to-end integration test for the goal lifecycle.
//
// This single test exercises the complete Waypoint flow:
//
//   1. Build a graph with a recording observer and a tight escalation
//      threshold
//   2. Add goal A (no deps) and goal B depending on A → B is blocked
//      from the moment it is created
//   3. Add a high-risk goal → escalation fires at creation, owner is
//      notified
//   4. Add a stale goal whose expiry has already passed
//   5. Run one tick: only the ready goals reach the hook, the stale
//      goal is cancelled with an "expired" reason
//   6. Complete A, run another tick → B unblocks and is dispatched
//   7. Complete B; a second complete is a no-op returning false
//   8. Export the graph, mutate it, import the snapshot back → the
//      pre-mutation state is reproduced exactly
//
// VERIFY:
//   - Blocking is visible immediately at insert, not only after a tick
//   - Hooks see exactly the ready set, highest priority first
//   - The reaper, resolver, and escalation monitor all run inside one
//     tick, in that order's observable effects
//   - Every state change leaves an audit entry on the goal
//   - The observer saw the escalation notification and the event stream

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use waypoint_graph::{
    AddGoal, EscalationConfig, Goal, GoalGraph, GoalStatus, GraphError, GraphEvent,
    GraphEventKind, Observer, Observers,
};
use waypoint_runtime::{ExecutionLoop, LoopConfig};

/// Records everything the graph emits so the test can assert on it.
#[derive(Default)]
struct Recording {
    events: Mutex<Vec<GraphEvent>>,
    notifications: Mutex<Vec<(String, String)>>,
}

/// Local sink wrapper so the shared recording can be registered as an
/// observer from outside the graph crate.
struct RecordingSink(Arc<Recording>);

impl Observer for RecordingSink {
    fn audit(&self, event: &GraphEvent) -> Result<(), GraphError> {
        self.0.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn notify(&self, owner: &str, message: &str) -> Result<(), GraphError> {
        self.0
            .notifications
            .lock()
            .unwrap()
            .push((owner.to_string(), message.to_string()));
        Ok(())
    }
}

fn tick_loop(graph: Arc<GoalGraph>) -> ExecutionLoop {
    ExecutionLoop::new(
        graph,
        LoopConfig {
            tick_interval_ms: 10,
            join_timeout_ms: 1_000,
        },
    )
}

#[test]
fn full_goal_lifecycle() {
    // =========================================================
    // SETUP: graph with observer + escalation, loop with a hook
    // =========================================================
    let recording = Arc::new(Recording::default());
    let mut observers = Observers::new();
    observers.add_sink(Box::new(RecordingSink(Arc::clone(&recording))));

    let graph = Arc::new(
        GoalGraph::new()
            .with_observers(observers)
            .with_escalation(EscalationConfig {
                risk_threshold: 0.7,
                priority_threshold: 2.0,
                renotify_every_tick: false,
            }),
    );

    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let exec = tick_loop(Arc::clone(&graph));
    let recorder = Arc::clone(&dispatched);
    exec.register_hook("recorder", move |goal: &Goal| {
        recorder.lock().unwrap().push(goal.id);
        Ok(())
    });

    // =========================================================
    // STAGE 1: dependency blocking is immediate
    // =========================================================
    let a = graph.add_goal(AddGoal::new("write the report").priority(1.0));
    let b = graph.add_goal(
        AddGoal::new("publish the report")
            .priority(1.5)
            .depends_on([a]),
    );
    assert_eq!(graph.goal(a).unwrap().status, GoalStatus::Pending);
    assert_eq!(graph.goal(b).unwrap().status, GoalStatus::Blocked);
    assert!(graph.goal(b).unwrap().blocked_by.contains(&a));

    // =========================================================
    // STAGE 2: creation-time escalation notifies the owner
    // =========================================================
    let risky = graph.add_goal(
        AddGoal::new("migrate the database")
            .priority(0.5)
            .risk(0.9)
            .owner("oncall"),
    );
    {
        let notes = recording.notifications.lock().unwrap();
        assert!(
            notes.iter().any(|(owner, _)| owner == "oncall"),
            "escalation should notify the owner at creation"
        );
    }

    // =========================================================
    // STAGE 3: a stale goal is reaped during the tick
    // =========================================================
    let stale = graph.add_goal(
        AddGoal::new("respond to last week's page").expiry(Utc::now() - Duration::hours(1)),
    );

    exec.run_once();

    let reaped = graph.goal(stale).unwrap();
    assert_eq!(reaped.status, GoalStatus::Cancelled);
    assert!(reaped
        .audit
        .iter()
        .any(|e| e.event == "cancelled" && e.details["reason"]
            .as_str()
            .unwrap()
            .contains("expired")));

    // Only ready goals were dispatched: a and risky, never blocked b or
    // the stale goal. (risky escalated but stays schedulable.)
    {
        let seen = dispatched.lock().unwrap();
        assert!(seen.contains(&a));
        assert!(seen.contains(&risky));
        assert!(!seen.contains(&b));
        assert!(!seen.contains(&stale));
    }

    // =========================================================
    // STAGE 4: completing the dependency unblocks the dependent
    // =========================================================
    assert!(graph.complete_goal(a, Some("report drafted")));
    dispatched.lock().unwrap().clear();
    exec.run_once();

    // The ready list is snapshotted before statuses are recomputed, so
    // this tick only unblocks b; the next tick dispatches it.
    assert_eq!(graph.goal(b).unwrap().status, GoalStatus::Pending);
    assert!(graph.goal(b).unwrap().blocked_by.is_empty());
    assert!(!dispatched.lock().unwrap().contains(&b));

    exec.run_once();
    assert!(dispatched.lock().unwrap().contains(&b));

    // =========================================================
    // STAGE 5: terminal transitions are one-shot
    // =========================================================
    assert!(graph.complete_goal(b, None));
    let after_first = graph.goal(b).unwrap();
    assert_eq!(after_first.status, GoalStatus::Complete);

    assert!(!graph.complete_goal(b, None));
    let after_second = graph.goal(b).unwrap();
    assert_eq!(after_second.updated, after_first.updated);
    assert_eq!(after_second.audit.len(), after_first.audit.len());

    // =========================================================
    // STAGE 6: export → mutate → import restores the snapshot
    // =========================================================
    let snapshot = graph.export_graph();
    graph.cancel_goal(risky, "operator override");
    assert_eq!(graph.goal(risky).unwrap().status, GoalStatus::Cancelled);

    graph.import_graph(snapshot);
    assert_eq!(graph.goal(risky).unwrap().status, GoalStatus::Pending);
    assert_eq!(graph.goal(b).unwrap().status, GoalStatus::Complete);

    // =========================================================
    // VERIFY: the observer saw the whole event stream
    // =========================================================
    let events = recording.events.lock().unwrap();
    let kinds: Vec<GraphEventKind> = events.iter().map(|e| e.event).collect();
    assert!(kinds.contains(&GraphEventKind::GoalAdded));
    assert!(kinds.contains(&GraphEventKind::Escalation));
    assert!(kinds.contains(&GraphEventKind::GoalExpired));
    assert!(kinds.contains(&GraphEventKind::GoalCompleted));
}

#[test]
fn analytics_and_explanations_reflect_the_graph() {
    let graph = Arc::new(GoalGraph::new());
    let hub = graph.add_goal(AddGoal::new("land the refactor"));
    let d1 = graph.add_goal(AddGoal::new("update call sites").depends_on([hub]));
    let d2 = graph.add_goal(AddGoal::new("update docs").depends_on([hub]));
    graph.add_goal(AddGoal::new("unrelated chore"));

    let stats = graph.analytics();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.blocked, 2);
    let bottleneck = stats.bottleneck.expect("hub has dependents");
    assert_eq!(bottleneck.id, hub);
    assert_eq!(bottleneck.dependents, 2);

    let why = graph.explain_goal(d1).unwrap();
    assert!(why.reasons.iter().any(|r| r.contains("blocked by")));

    graph.complete_goal(hub, None);
    let exec = tick_loop(Arc::clone(&graph));
    exec.run_once();
    for id in [d1, d2] {
        assert_eq!(graph.goal(id).unwrap().status, GoalStatus::Pending);
    }
}

#[test]
fn dependency_cycle_stays_blocked_and_is_reported() {
    let graph = Arc::new(GoalGraph::new());
    let a = graph.add_goal(AddGoal::new("a"));
    let b = graph.add_goal(AddGoal::new("b").depends_on([a]));

    // Close the loop through a snapshot edit: a ← b.
    let mut snapshot = graph.export_graph();
    if let Some(goal) = snapshot.goals.get_mut(&a) {
        goal.add_dependency(b);
    }
    graph.import_graph(snapshot);

    let exec = tick_loop(Arc::clone(&graph));
    exec.run_once();

    let cycles = waypoint_graph::detect_cycles(&graph);
    assert_eq!(cycles.len(), 1);
    assert!(waypoint_graph::cycle_contains(&cycles[0], &[a, b]));

    // Ticking forever never unblocks either side.
    exec.run_once();
    assert_eq!(graph.goal(a).unwrap().status, GoalStatus::Blocked);
    assert_eq!(graph.goal(b).unwrap().status, GoalStatus::Blocked);
}
