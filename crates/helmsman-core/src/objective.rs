//! Objective types for the Helmsman engine.
//!
//! An Objective is the persisted unit of work tracking one user request
//! from submission to terminal outcome. Its status follows a strict
//! one-directional state machine and its attempt history is append-only,
//! so the terminal record is always the single source of truth for what
//! happened, including partially created resources after a failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{HelmsmanError, Result};
use crate::intent::Intent;
use crate::types::{AttemptOutcome, ObjectiveStatus};

/// The persisted unit of work for one user request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    /// Unique identifier, assigned at creation, never reused.
    pub id: Uuid,

    /// The original natural-language request (opaque to this core).
    pub request: String,

    /// The structured intent parsed from the request.
    pub intent: Intent,

    /// Current lifecycle status.
    pub status: ObjectiveStatus,

    /// Identifier of the strategy currently or most recently attempted.
    pub selected_strategy: Option<String>,

    /// Ordered, append-only attempt history (insertion order is
    /// chronological order).
    pub attempts: Vec<AttemptRecord>,

    /// Resource identifiers accumulated across all attempts, deduplicated
    /// by identifier (resource ids act as idempotency keys). Grows only;
    /// shrinkage happens solely through explicit, recorded rollback.
    pub resources_created: Vec<String>,

    /// Resource identifiers that have been successfully torn down by a
    /// rollback pass. A resource listed here is never torn down again.
    #[serde(default)]
    pub rolled_back: Vec<String>,

    /// Cost estimated before execution started (monthly).
    pub estimated_cost: f64,

    /// Cost accrued so far across completed attempts.
    pub total_cost: f64,

    /// Terminal error detail, set when the objective fails.
    pub error: Option<String>,

    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
}

/// Record of one execution try (or one rollback pass).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// The strategy that performed this attempt.
    pub strategy_id: String,

    /// 1-based attempt number, monotonically increasing per strategy
    /// within the objective.
    pub attempt_number: u32,

    /// Outcome of the attempt.
    pub outcome: AttemptOutcome,

    /// Error detail if the attempt failed.
    pub error_detail: Option<String>,

    /// Wall-clock duration of the attempt in milliseconds.
    pub duration_ms: u64,

    /// Resources attributed to this attempt. For a rollback record these
    /// are the resources successfully torn down.
    pub resources_created: Vec<String>,

    /// Outputs produced by the attempt, if any.
    #[serde(default)]
    pub outputs: Map<String, Value>,

    /// True if this record documents a rollback pass rather than a
    /// forward execution attempt.
    #[serde(default)]
    pub is_rollback: bool,

    /// Timestamp when the attempt finished.
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    /// Create a record for a forward execution attempt.
    pub fn new(strategy_id: impl Into<String>, attempt_number: u32, outcome: AttemptOutcome) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            attempt_number,
            outcome,
            error_detail: None,
            duration_ms: 0,
            resources_created: Vec::new(),
            outputs: Map::new(),
            is_rollback: false,
            timestamp: Utc::now(),
        }
    }

    /// Create a record for a rollback pass.
    pub fn rollback(strategy_id: impl Into<String>, attempt_number: u32, outcome: AttemptOutcome) -> Self {
        let mut record = Self::new(strategy_id, attempt_number, outcome);
        record.is_rollback = true;
        record
    }

    /// Attach an error detail.
    pub fn with_error(mut self, detail: impl Into<String>) -> Self {
        self.error_detail = Some(detail.into());
        self
    }

    /// Attach the attempt duration.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Attach the resources touched by this attempt.
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources_created = resources;
        self
    }

    /// Attach the attempt outputs.
    pub fn with_outputs(mut self, outputs: Map<String, Value>) -> Self {
        self.outputs = outputs;
        self
    }
}

impl Objective {
    /// Create a new objective in the Pending state.
    pub fn new(request: impl Into<String>, intent: Intent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            request: request.into(),
            intent,
            status: ObjectiveStatus::Pending,
            selected_strategy: None,
            attempts: Vec::new(),
            resources_created: Vec::new(),
            rolled_back: Vec::new(),
            estimated_cost: 0.0,
            total_cost: 0.0,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new status, enforcing the one-directional state
    /// machine. Terminal states are immutable and no transition skips a
    /// state.
    pub fn transition_to(&mut self, next: ObjectiveStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(HelmsmanError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Append an attempt record, merging its resources into the
    /// objective. Resource ids are idempotency keys: a resource reported
    /// by two attempts is recorded once.
    pub fn record_attempt(&mut self, attempt: AttemptRecord) {
        if attempt.is_rollback {
            for resource in &attempt.resources_created {
                if !self.rolled_back.contains(resource) {
                    self.rolled_back.push(resource.clone());
                }
            }
        } else {
            for resource in &attempt.resources_created {
                if !self.resources_created.contains(resource) {
                    self.resources_created.push(resource.clone());
                }
            }
            self.selected_strategy = Some(attempt.strategy_id.clone());
        }
        self.attempts.push(attempt);
        self.touch();
    }

    /// Number of forward attempts made by the given strategy.
    pub fn attempts_for(&self, strategy_id: &str) -> u32 {
        self.attempts
            .iter()
            .filter(|a| !a.is_rollback && a.strategy_id == strategy_id)
            .count() as u32
    }

    /// Number of failed forward attempts made by the given strategy.
    pub fn failures_for(&self, strategy_id: &str) -> u32 {
        self.attempts
            .iter()
            .filter(|a| {
                !a.is_rollback
                    && a.strategy_id == strategy_id
                    && a.outcome != AttemptOutcome::Success
            })
            .count() as u32
    }

    /// Resources created but not yet torn down: the inspection surface
    /// for partial-rollback state after a failure.
    pub fn outstanding_resources(&self) -> Vec<String> {
        self.resources_created
            .iter()
            .filter(|r| !self.rolled_back.contains(r))
            .cloned()
            .collect()
    }

    /// The strategy that created a resource, if any attempt reported it.
    pub fn creator_of(&self, resource_id: &str) -> Option<&str> {
        self.attempts
            .iter()
            .find(|a| !a.is_rollback && a.resources_created.iter().any(|r| r == resource_id))
            .map(|a| a.strategy_id.as_str())
    }

    /// Accrue cost from a completed attempt.
    pub fn accrue_cost(&mut self, cost: f64) {
        self.total_cost += cost;
        self.touch();
    }

    /// Bump the updated-at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
