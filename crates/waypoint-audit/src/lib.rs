// lib.rs — waypoint-audit: on-disk audit trail for goal graphs.

//! Append-only JSONL audit trail for Waypoint.
//!
//! Two ways to get a trail on disk:
//!
//! - [`JsonlSink`], an observer registered on the graph that streams
//!   every event to the file as it happens;
//! - [`AuditLog::export_graph`], which dumps the accumulated trail
//!   (per-goal audit entries merged with the graph event stream, in
//!   timestamp order) after the fact.
//!
//! ```rust,no_run
//! use waypoint_audit::AuditLog;
//! use waypoint_graph::GoalGraph;
//!
//! # fn demo(graph: &GoalGraph) -> Result<(), waypoint_audit::AuditError> {
//! let mut log = AuditLog::open("/tmp/waypoint-audit.jsonl")?;
//! let written = log.export_graph(graph)?;
//! println!("wrote {written} records");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod log;
pub mod sink;

pub use error::AuditError;
pub use log::{AuditLog, AuditRecord};
pub use sink::JsonlSink;
