// events.rs — Graph-level event model and observer fan-out.
//
// Every structural mutation on the graph produces one GraphEvent. Events
// accumulate in the graph's own log (exportable for observability) and
// stream to any registered Observer sinks. Sinks observe and record; they
// can never affect graph state, and a failing sink never fails the
// mutation that produced the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GraphError;

/// What a graph event records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GraphEventKind {
    GoalAdded,
    GoalCompleted,
    GoalFailed,
    GoalCancelled,
    GoalExpired,
    GoalUndone,
    Escalation,
    HookFailed,
}

impl std::fmt::Display for GraphEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GoalAdded => "goal_added",
            Self::GoalCompleted => "goal_completed",
            Self::GoalFailed => "goal_failed",
            Self::GoalCancelled => "goal_cancelled",
            Self::GoalExpired => "goal_expired",
            Self::GoalUndone => "goal_undone",
            Self::Escalation => "escalation",
            Self::HookFailed => "hook_failed",
        };
        f.write_str(name)
    }
}

/// One line in the graph's append-only event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEvent {
    /// What happened.
    pub event: GraphEventKind,

    /// Which goal it happened to.
    pub goal_id: Uuid,

    /// When it happened (UTC).
    pub timestamp: DateTime<Utc>,

    /// Failure/cancellation reason or escalation message, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GraphEvent {
    pub fn new(event: GraphEventKind, goal_id: Uuid) -> Self {
        Self {
            event,
            goal_id,
            timestamp: Utc::now(),
            reason: None,
        }
    }

    pub fn with_reason(event: GraphEventKind, goal_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            event,
            goal_id,
            timestamp: Utc::now(),
            reason: Some(reason.into()),
        }
    }
}

/// Trait for observing the scheduler from the outside.
///
/// One injected surface for the three outward-facing concerns: the audit
/// stream, operator notifications (escalation/expiry), and metrics. All
/// methods default to no-ops so a sink only implements what it cares
/// about. Errors are logged by the dispatcher but never stop the system.
pub trait Observer: Send + Sync {
    /// A graph event was recorded.
    fn audit(&self, _event: &GraphEvent) -> Result<(), GraphError> {
        Ok(())
    }

    /// Deliver a notification to an owner. The scheduler never delivers
    /// notifications itself — it only invokes this.
    fn notify(&self, _owner: &str, _message: &str) -> Result<(), GraphError> {
        Ok(())
    }

    /// A counter/gauge sample.
    fn metric(&self, _name: &str, _value: f64) -> Result<(), GraphError> {
        Ok(())
    }
}

/// Dispatches events, notifications, and metrics to registered sinks.
///
/// Errors from individual sinks are logged (via tracing) but don't
/// prevent other sinks from receiving the event.
#[derive(Default)]
pub struct Observers {
    sinks: Vec<Box<dyn Observer>>,
}

impl Observers {
    /// Create a dispatcher with no sinks.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add an observer sink.
    pub fn add_sink(&mut self, sink: Box<dyn Observer>) {
        self.sinks.push(sink);
    }

    pub fn audit(&self, event: &GraphEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.audit(event) {
                tracing::warn!("audit sink error: {}", e);
            }
        }
    }

    pub fn notify(&self, owner: &str, message: &str) {
        for sink in &self.sinks {
            if let Err(e) = sink.notify(owner, message) {
                tracing::warn!("notify sink error: {}", e);
            }
        }
    }

    pub fn metric(&self, name: &str, value: f64) {
        for sink in &self.sinks {
            if let Err(e) = sink.metric(name, value) {
                tracing::warn!("metric sink error: {}", e);
            }
        }
    }
}

/// Logs notifications and metrics through `tracing` (always-available sink).
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn audit(&self, event: &GraphEvent) -> Result<(), GraphError> {
        tracing::debug!(goal_id = %event.goal_id, event = ?event.event, "graph event");
        Ok(())
    }

    fn notify(&self, owner: &str, message: &str) -> Result<(), GraphError> {
        tracing::info!(owner, "{}", message);
        Ok(())
    }

    fn metric(&self, name: &str, value: f64) -> Result<(), GraphError> {
        tracing::debug!(metric = name, value, "metric sample");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records everything it sees — used across this crate's tests.
    #[derive(Default)]
    pub struct RecordingObserver {
        pub audits: Mutex<Vec<GraphEvent>>,
        pub notifications: Mutex<Vec<(String, String)>>,
    }

    impl Observer for Arc<RecordingObserver> {
        fn audit(&self, event: &GraphEvent) -> Result<(), GraphError> {
            self.audits.lock().unwrap().push(event.clone());
            Ok(())
        }

        fn notify(&self, owner: &str, message: &str) -> Result<(), GraphError> {
            self.notifications
                .lock()
                .unwrap()
                .push((owner.to_string(), message.to_string()));
            Ok(())
        }
    }

    struct FailingSink;

    impl Observer for FailingSink {
        fn audit(&self, _event: &GraphEvent) -> Result<(), GraphError> {
            Err(GraphError::SinkError("always fails".into()))
        }
    }

    #[test]
    fn event_serialization_round_trip() {
        let event = GraphEvent::with_reason(GraphEventKind::GoalFailed, Uuid::new_v4(), "boom");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"goal_failed\""));
        let restored: GraphEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.event, GraphEventKind::GoalFailed);
        assert_eq!(restored.reason.as_deref(), Some("boom"));
    }

    #[test]
    fn reason_omitted_when_absent() {
        let event = GraphEvent::new(GraphEventKind::GoalAdded, Uuid::new_v4());
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("reason"));
    }

    #[test]
    fn dispatcher_fans_out_to_all_sinks() {
        let first = Arc::new(RecordingObserver::default());
        let second = Arc::new(RecordingObserver::default());
        let mut observers = Observers::new();
        observers.add_sink(Box::new(Arc::clone(&first)));
        observers.add_sink(Box::new(Arc::clone(&second)));

        observers.audit(&GraphEvent::new(GraphEventKind::GoalAdded, Uuid::new_v4()));
        observers.notify("ada", "escalated");

        assert_eq!(first.audits.lock().unwrap().len(), 1);
        assert_eq!(second.audits.lock().unwrap().len(), 1);
        assert_eq!(first.notifications.lock().unwrap().len(), 1);
    }

    #[test]
    fn failing_sink_does_not_stop_others() {
        let recorder = Arc::new(RecordingObserver::default());
        let mut observers = Observers::new();
        observers.add_sink(Box::new(FailingSink));
        observers.add_sink(Box::new(Arc::clone(&recorder)));

        observers.audit(&GraphEvent::new(GraphEventKind::GoalAdded, Uuid::new_v4()));
        assert_eq!(recorder.audits.lock().unwrap().len(), 1);
    }
}
