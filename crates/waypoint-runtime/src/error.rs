// error.rs — Error types for the execution loop.

use thiserror::Error;

/// Errors from loop lifecycle management. Hook failures are not errors
/// at this level — they fail the affected goal and the tick carries on.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `start()` was called while the worker is already running.
    #[error("execution loop is already running")]
    AlreadyRunning,

    /// `stop()` was called while the worker is not running.
    #[error("execution loop is not running")]
    NotRunning,

    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
