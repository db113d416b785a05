// error.rs — Error types for the goal graph.

use thiserror::Error;

/// Errors that can occur during graph persistence and observer dispatch.
///
/// Mutations on the graph itself never fail — unknown ids and terminal
/// goals are reported through boolean/optional returns, not errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize graph data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// An observer sink rejected an event (non-fatal; logged, not propagated).
    #[error("observer sink error: {0}")]
    SinkError(String),
}
