//! Append-only audit trail of objective state transitions.
//!
//! Every state transition is recorded as one JSON line in `audit.jsonl`
//! so that crash recovery can scan what the engine was doing when the
//! process died.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use helmsman_core::Result;
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Types of auditable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// An objective was created.
    Created,
    /// An objective changed status.
    StatusChanged,
    /// A forward execution attempt was recorded.
    AttemptRecorded,
    /// A rollback pass was recorded.
    RollbackRecorded,
    /// Execution was blocked by the budget monitor.
    BudgetBlocked,
    /// An interrupted objective was handled by the recovery policy.
    Recovered,
    /// An objective was administratively deleted.
    Deleted,
}

/// One audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// The objective the event belongs to.
    pub objective_id: Uuid,

    /// What happened.
    pub event_type: AuditEventType,

    /// Human-readable detail.
    pub detail: String,
}

impl AuditEvent {
    /// Create a new event stamped with the current time.
    pub fn new(objective_id: Uuid, event_type: AuditEventType, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            objective_id,
            event_type,
            detail: detail.into(),
        }
    }
}

/// Append-only JSONL audit log.
pub struct AuditLog {
    path: PathBuf,
    // Serializes appends so lines never interleave.
    write_lock: Mutex<()>,
}

impl AuditLog {
    /// Open (or create) the audit log under the given directory.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("audit.jsonl"),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event, flushed to disk before returning.
    pub async fn append(&self, event: AuditEvent) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;
        Ok(())
    }

    /// Read the full audit trail in append order. Lines that fail to
    /// parse are skipped with a warning rather than poisoning the scan.
    pub async fn read_all(&self) -> Result<Vec<AuditEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = tokio::fs::read_to_string(&self.path).await?;
        let mut events = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEvent>(line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    tracing::warn!("Skipping unparseable audit line: {}", err);
                }
            }
        }
        Ok(events)
    }

    /// Read the audit trail for a single objective.
    pub async fn events_for(&self, objective_id: Uuid) -> Result<Vec<AuditEvent>> {
        let events = self.read_all().await?;
        Ok(events
            .into_iter()
            .filter(|e| e.objective_id == objective_id)
            .collect())
    }
}
