//! Error types for the Helmsman engine.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for Helmsman operations.
#[derive(Error, Debug, Clone)]
pub enum HelmsmanError {
    /// The objective store is unreachable or its contents are corrupt.
    /// Fatal to the current operation; never silently swallowed.
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// A record was not found in the store.
    #[error("Not found: objective {id}")]
    NotFound { id: Uuid },

    /// No registered strategy can handle the context. Surfaced
    /// immediately, never retried.
    #[error("No capable strategy found: {detail}")]
    NoStrategyFound { detail: String },

    /// Execution was blocked by the budget monitor before any attempt.
    #[error("Budget exceeded: estimated {estimated:.2}, limit {limit:.2}")]
    BudgetExceeded {
        objective_id: Uuid,
        estimated: f64,
        limit: f64,
    },

    /// A transient execution failure; the same strategy may be retried.
    #[error("Retriable execution failure ({strategy_id}): {message}")]
    RetriableExecution { strategy_id: String, message: String },

    /// A permanent execution failure; the orchestrator falls back.
    #[error("Fatal execution failure ({strategy_id}): {message}")]
    FatalExecution { strategy_id: String, message: String },

    /// Partial cleanup failure. Logged and attached to the objective;
    /// never retried on its own.
    #[error("Rollback failed for resource {resource_id}: {message}")]
    Rollback { resource_id: String, message: String },

    /// The objective was cancelled between attempts.
    #[error("Cancelled: {reason}")]
    Cancelled { reason: String },

    /// An illegal objective state transition was requested.
    #[error("Invalid transition {from:?} -> {to:?} for objective {id}")]
    InvalidTransition {
        id: Uuid,
        from: crate::ObjectiveStatus,
        to: crate::ObjectiveStatus,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Intent validation failed.
    #[error("Intent invalid: {message}")]
    IntentInvalid { message: String },

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HelmsmanError {
    /// Returns true if the same strategy may be retried after this error.
    pub fn is_retriable(&self) -> bool {
        matches!(self, HelmsmanError::RetriableExecution { .. })
    }

    /// Returns the objective ID if the error carries one.
    pub fn objective_id(&self) -> Option<Uuid> {
        match self {
            HelmsmanError::NotFound { id } => Some(*id),
            HelmsmanError::BudgetExceeded { objective_id, .. } => Some(*objective_id),
            HelmsmanError::InvalidTransition { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Convenience Result type for Helmsman operations.
pub type Result<T> = std::result::Result<T, HelmsmanError>;

impl From<serde_json::Error> for HelmsmanError {
    fn from(err: serde_json::Error) -> Self {
        HelmsmanError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for HelmsmanError {
    fn from(err: std::io::Error) -> Self {
        HelmsmanError::Persistence {
            message: err.to_string(),
        }
    }
}
