//! Common types shared across the Helmsman engine.

use serde::{Deserialize, Serialize};

/// Status of an Objective in the system.
///
/// The state machine is strictly one-directional:
/// `Pending -> InProgress -> {Completed | Failed}`. Terminal states are
/// immutable and no transition may skip a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    /// Objective has been created but execution has not started.
    Pending,
    /// A strategy chain has been selected and the attempt loop is running.
    InProgress,
    /// Execution succeeded; the objective is terminal.
    Completed,
    /// Execution failed (or was cancelled); the objective is terminal.
    Failed,
}

impl ObjectiveStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ObjectiveStatus::Completed | ObjectiveStatus::Failed)
    }

    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: ObjectiveStatus) -> bool {
        matches!(
            (self, next),
            (ObjectiveStatus::Pending, ObjectiveStatus::InProgress)
                | (ObjectiveStatus::InProgress, ObjectiveStatus::Completed)
                | (ObjectiveStatus::InProgress, ObjectiveStatus::Failed)
        )
    }
}

/// Outcome of a single execution attempt.
///
/// Retry and fallback decisions are driven by this explicit union rather
/// than by matching on error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The attempt succeeded.
    Success,
    /// The attempt failed transiently; the same strategy may be retried.
    RetriableFailure,
    /// The attempt failed permanently; the orchestrator falls back.
    FatalFailure,
}

impl AttemptOutcome {
    /// Returns true if the same strategy may be retried after this outcome.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AttemptOutcome::RetriableFailure)
    }
}

/// Kind of execution backend behind a [`crate::Strategy`].
///
/// The ordering reflects idempotency and safety: protocol-native backends
/// rank above infrastructure-as-code, which ranks above direct CLI
/// invocation, which ranks above generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Calls a remote protocol endpoint natively.
    Protocol,
    /// Generates and applies an infrastructure-as-code definition.
    InfraAsCode,
    /// Shells out to a provider command-line tool.
    Cli,
    /// Generates and runs ad hoc code.
    GeneratedCode,
}

impl StrategyKind {
    /// Static base priority for strategy selection. Higher is preferred.
    pub fn base_priority(&self) -> f64 {
        match self {
            StrategyKind::Protocol => 0.9,
            StrategyKind::InfraAsCode => 0.8,
            StrategyKind::Cli => 0.7,
            StrategyKind::GeneratedCode => 0.6,
        }
    }
}

/// Alert level of a budget decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// Projected spend is comfortably within the limit.
    Ok,
    /// Projected spend is at or above 50% of the limit.
    Warning,
    /// Projected spend is at or above 80% of the limit.
    Critical,
    /// Projected spend meets or exceeds the limit; execution is blocked.
    Exceeded,
}
