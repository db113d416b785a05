// log.rs — Append-only JSONL audit log.
//
// The audit trail is stored as a JSONL (JSON Lines) file: one JSON
// object per line. Append-friendly, and easy to inspect with standard
// tools (jq, grep, tail -f).

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use waypoint_graph::{AuditEntry, GoalGraph, GraphEvent};

use crate::error::AuditError;

/// One line of the audit trail.
///
/// Records come from two places and share this shape: graph-level
/// events (goal added, completed, escalated, ...) and per-goal audit
/// entries (progress updates, feedback, hook failures, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub goal_id: Uuid,
    pub event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl AuditRecord {
    pub fn from_event(event: &GraphEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            goal_id: event.goal_id,
            event: event.event.to_string(),
            details: match &event.reason {
                Some(reason) => serde_json::json!({ "reason": reason }),
                None => Value::Null,
            },
        }
    }

    pub fn from_entry(goal_id: Uuid, entry: &AuditEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            goal_id,
            event: entry.event.clone(),
            details: entry.details.clone(),
        }
    }
}

/// An append-only audit log backed by a JSONL file.
///
/// Writes go through a `BufWriter`, flushed after each record so a
/// crash never loses more than the record being written.
pub struct AuditLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl AuditLog {
    /// Open (or create) an audit log at the given path. Existing
    /// content is never overwritten; the file is opened in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Where this log lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single JSON line and flush.
    pub fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write the full audit trail of a graph: every goal's audit
    /// entries plus the graph's event stream, merged and ordered by
    /// timestamp. Returns the number of records written.
    pub fn export_graph(&mut self, graph: &GoalGraph) -> Result<usize, AuditError> {
        let mut records = Vec::new();
        for goal in graph.all_goals() {
            for entry in &goal.audit {
                records.push(AuditRecord::from_entry(goal.id, entry));
            }
        }
        for event in graph.events() {
            records.push(AuditRecord::from_event(&event));
        }
        records.sort_by_key(|r| r.timestamp);

        for record in &records {
            self.append(record)?;
        }
        Ok(records.len())
    }

    /// Read all records from a log file, oldest first. Blank lines are
    /// skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>, AuditError> {
        let file = File::open(path.as_ref()).map_err(|source| AuditError::OpenFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use waypoint_graph::AddGoal;

    #[test]
    fn append_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let mut log = AuditLog::open(&path).unwrap();
        let id = Uuid::new_v4();
        log.append(&AuditRecord {
            timestamp: Utc::now(),
            goal_id: id,
            event: "created".to_string(),
            details: serde_json::json!({ "priority": 1.5 }),
        })
        .unwrap();

        let records = AuditLog::read_all(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].goal_id, id);
        assert_eq!(records[0].event, "created");
        assert_eq!(records[0].details["priority"], 1.5);
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let id = Uuid::new_v4();

        for event in ["first", "second"] {
            let mut log = AuditLog::open(&path).unwrap();
            log.append(&AuditRecord {
                timestamp: Utc::now(),
                goal_id: id,
                event: event.to_string(),
                details: Value::Null,
            })
            .unwrap();
        }

        let records = AuditLog::read_all(&path).unwrap();
        let events: Vec<&str> = records.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(events, vec!["first", "second"]);
    }

    #[test]
    fn export_graph_merges_entries_and_events_in_time_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let graph = GoalGraph::new();
        let a = graph.add_goal(AddGoal::new("first"));
        graph.set_progress(a, 0.5);
        graph.complete_goal(a, Some("done"));

        let mut log = AuditLog::open(&path).unwrap();
        let written = log.export_graph(&graph).unwrap();
        assert!(written >= 4, "added + progress + completed entries plus events");

        let records = AuditLog::read_all(&path).unwrap();
        assert_eq!(records.len(), written);
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(records.iter().any(|r| r.event == "goal_completed"));
        assert!(records
            .iter()
            .any(|r| r.event == "progress" && r.details["progress"] == 0.5));
    }

    #[test]
    fn read_missing_file_is_open_failed() {
        let dir = tempdir().unwrap();
        let err = AuditLog::read_all(dir.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, AuditError::OpenFailed { .. }));
    }
}
