// lib.rs — waypoint-runtime: the background process around the goal graph.

//! Drives a [`waypoint_graph::GoalGraph`] on a fixed cadence.
//!
//! The graph crate is deliberately passive: it holds state and exposes
//! mutations, but nothing in it runs on its own. This crate supplies the
//! motion — an [`ExecutionLoop`] that ticks on a worker thread,
//! dispatching registered [`Handler`]s to every ready goal and then
//! recomputing statuses, expiries, priorities, and escalations.
//!
//! ```no_run
//! use std::sync::Arc;
//! use waypoint_graph::{AddGoal, Goal, GoalGraph};
//! use waypoint_runtime::{ExecutionLoop, LoopConfig};
//!
//! let graph = Arc::new(GoalGraph::new());
//! graph.add_goal(AddGoal::new("ship the release"));
//!
//! let exec = ExecutionLoop::new(graph, LoopConfig::default());
//! exec.register_hook("announce", |goal: &Goal| {
//!     println!("working on: {}", goal.description);
//!     Ok(())
//! });
//! exec.start()?;
//! // ... later ...
//! exec.stop()?;
//! # Ok::<(), waypoint_runtime::RuntimeError>(())
//! ```

pub mod config;
pub mod error;
pub mod exec_loop;
pub mod hooks;

pub use config::LoopConfig;
pub use error::RuntimeError;
pub use exec_loop::ExecutionLoop;
pub use hooks::{Handler, HookRegistry};
