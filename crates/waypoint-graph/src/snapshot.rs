// snapshot.rs — Structural snapshot for export/import.
//
// The only durability mechanism: a whole-graph copy, serializable as one
// JSON document. Import replaces in-memory state wholesale — it is not a
// merge. There is no write-ahead log or incremental journal.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GraphError;
use crate::goal::Goal;

/// A point-in-time copy of the goal arena and insertion history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Every goal, keyed by id.
    pub goals: HashMap<Uuid, Goal>,

    /// Goal ids in insertion order — drives `undo_last` after import.
    pub history: Vec<Uuid>,
}

impl GraphSnapshot {
    /// Write the snapshot as pretty-printed JSON.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| GraphError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Read a snapshot back from a JSON file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| GraphError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
