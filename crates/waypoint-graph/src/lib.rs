//! # waypoint-graph
//!
//! Goal data model, dependency graph, and scheduling passes for Waypoint.
//!
//! A [`Goal`] is a schedulable unit of work with identity, status,
//! priority, and dependency/subgoal/link relations. The [`GoalGraph`]
//! owns every goal behind a single exclusive lock and exposes mutations,
//! status queries, snapshot persistence, and introspection. The
//! scheduling passes — [`StatusResolver`], [`PriorityScheduler`],
//! [`EscalationMonitor`] (graph-internal), and [`ExpiryReaper`] — derive
//! execution state from the single source of truth (`dependencies`) on
//! every tick.
//!
//! ## Key components
//!
//! - [`Goal`] / [`GoalStatus`] — the data model and its state set
//!   (pending → blocked ↔ pending; complete/failed/cancelled terminal)
//! - [`GoalGraph`] — the lock-protected arena store
//! - [`StatusResolver`] — blocked/pending derivation + cycle detection
//! - [`PriorityScheduler`] — deterministic priority policy + ready order
//! - [`ExpiryReaper`] — auto-cancel of expired goals
//! - [`Observer`] / [`Observers`] — injected audit/notify/metric sinks
//! - [`GraphSnapshot`] — wholesale export/import persistence

pub mod analytics;
pub mod error;
pub mod escalation;
pub mod events;
pub mod goal;
pub mod graph;
pub mod priority;
pub mod reaper;
pub mod resolver;
pub mod snapshot;

pub use analytics::{Analytics, Bottleneck, Explanation};
pub use error::GraphError;
pub use escalation::{EscalationConfig, EscalationMonitor};
pub use events::{GraphEvent, GraphEventKind, Observer, Observers, TracingObserver};
pub use goal::{AddGoal, AuditEntry, Goal, GoalStatus};
pub use graph::GoalGraph;
pub use priority::{ready_order, sort_ready, PriorityConfig, PriorityScheduler};
pub use reaper::ExpiryReaper;
pub use resolver::{cycle_contains, detect_cycles, StatusResolver};
pub use snapshot::GraphSnapshot;
