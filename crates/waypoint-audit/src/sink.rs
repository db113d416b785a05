// sink.rs — Observer sink that streams graph events to a JSONL log.

use std::path::Path;
use std::sync::Mutex;

use waypoint_graph::{GraphError, GraphEvent, Observer};

use crate::error::AuditError;
use crate::log::{AuditLog, AuditRecord};

/// Streams every graph event to an append-only JSONL file as it
/// happens.
///
/// Register this on the graph's [`waypoint_graph::Observers`] to get a
/// live on-disk trail, as opposed to [`AuditLog::export_graph`], which
/// dumps accumulated state after the fact. The log sits behind a mutex
/// because observers are invoked from whatever thread mutated the
/// graph.
pub struct JsonlSink {
    log: Mutex<AuditLog>,
}

impl JsonlSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        Ok(Self {
            log: Mutex::new(AuditLog::open(path)?),
        })
    }
}

impl Observer for JsonlSink {
    fn audit(&self, event: &GraphEvent) -> Result<(), GraphError> {
        let record = AuditRecord::from_event(event);
        let mut log = self
            .log
            .lock()
            .map_err(|_| GraphError::SinkError("audit log lock poisoned".to_string()))?;
        log.append(&record)
            .map_err(|e| GraphError::SinkError(e.to_string()))
    }
}
