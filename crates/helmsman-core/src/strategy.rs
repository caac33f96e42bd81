//! The Strategy interface and execution outcome types.
//!
//! A Strategy is one pluggable execution backend (a protocol client, an
//! infrastructure-as-code generator, a CLI wrapper, a code generator).
//! The orchestrator drives every backend identically through this trait
//! and has no knowledge of what a strategy does internally.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::intent::Intent;
use crate::objective::Objective;
use crate::types::{AttemptOutcome, StrategyKind};

/// Context a strategy receives for capability checks, cost estimation
/// and execution. Built from the objective by the orchestrator; read-only
/// from the strategies' point of view.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// The objective being executed.
    pub objective_id: Uuid,

    /// The structured intent.
    pub intent: Intent,

    /// The original natural-language request.
    pub request: String,

    /// Failed forward attempts per strategy, derived from the objective's
    /// attempt history. Drives the selector's prior-failure penalty.
    pub prior_failures: HashMap<String, u32>,

    /// Strategy id explicitly preferred by the user, if any.
    pub preferred_strategy: Option<String>,

    /// Target region, if the intent names one.
    pub region: Option<String>,
}

impl ExecutionContext {
    /// Build a context from an objective.
    pub fn from_objective(objective: &Objective, preferred_strategy: Option<String>) -> Self {
        let mut prior_failures: HashMap<String, u32> = HashMap::new();
        for attempt in &objective.attempts {
            if !attempt.is_rollback && attempt.outcome != AttemptOutcome::Success {
                *prior_failures.entry(attempt.strategy_id.clone()).or_insert(0) += 1;
            }
        }

        let region = objective
            .intent
            .parameter_str("region")
            .map(|s| s.to_string());

        Self {
            objective_id: objective.id,
            intent: objective.intent.clone(),
            request: objective.request.clone(),
            prior_failures,
            preferred_strategy,
            region,
        }
    }

    /// Failed attempts previously made by the given strategy.
    pub fn prior_failures_for(&self, strategy_id: &str) -> u32 {
        self.prior_failures.get(strategy_id).copied().unwrap_or(0)
    }
}

/// Result of one strategy execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the backend reported success.
    pub success: bool,

    /// Backend-specific outputs (endpoints, IDs, applied configuration).
    #[serde(default)]
    pub outputs: Map<String, Value>,

    /// Identifiers of resources created by this execution.
    #[serde(default)]
    pub resources_created: Vec<String>,

    /// The error signal if the execution failed.
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    /// A successful result with the given resources.
    pub fn success(resources_created: Vec<String>) -> Self {
        Self {
            success: true,
            outputs: Map::new(),
            resources_created,
            error: None,
        }
    }

    /// A failed result with the given error signal. Resources that were
    /// created before the failure must still be reported.
    pub fn failure(error: ExecutionError) -> Self {
        Self {
            success: false,
            outputs: Map::new(),
            resources_created: Vec::new(),
            error: None,
        }
        .with_error(error)
    }

    /// A single-resource view used for per-resource rollback calls.
    pub fn for_resource(resource_id: impl Into<String>) -> Self {
        Self {
            success: true,
            outputs: Map::new(),
            resources_created: vec![resource_id.into()],
            error: None,
        }
    }

    /// Attach outputs.
    pub fn with_outputs(mut self, outputs: Map<String, Value>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Attach resources created before a failure.
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources_created = resources;
        self
    }

    fn with_error(mut self, error: ExecutionError) -> Self {
        self.error = Some(error);
        self
    }

    /// Classify this result into an attempt outcome.
    pub fn outcome(&self) -> AttemptOutcome {
        if self.success {
            AttemptOutcome::Success
        } else {
            match &self.error {
                Some(error) => classify(error.kind),
                None => AttemptOutcome::FatalFailure,
            }
        }
    }
}

/// The error signal emitted by a failed execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Machine-readable error category.
    pub kind: ExecutionErrorKind,

    /// Human-readable detail.
    pub message: String,
}

impl ExecutionError {
    /// Create a new error signal.
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Categories of execution error signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    /// The backend call timed out.
    Timeout,
    /// Transient network failure (connection reset, DNS hiccup).
    NetworkTransient,
    /// The provider throttled the request.
    RateLimited,
    /// The request was rejected as invalid.
    Validation,
    /// The caller lacks permission for the operation.
    PermissionDenied,
    /// A provider quota is exhausted.
    QuotaExceeded,
    /// A resource with the same identity already exists.
    ResourceConflict,
    /// Unclassified failure.
    Unknown,
}

/// Classify an error signal into an attempt outcome.
///
/// This is the single classification function shared by the retry loop
/// and the selector's prior-failure penalty. Unknown signals classify as
/// fatal: retrying an unclassified infrastructure failure risks
/// duplicating resources.
pub fn classify(kind: ExecutionErrorKind) -> AttemptOutcome {
    match kind {
        ExecutionErrorKind::Timeout
        | ExecutionErrorKind::NetworkTransient
        | ExecutionErrorKind::RateLimited => AttemptOutcome::RetriableFailure,
        ExecutionErrorKind::Validation
        | ExecutionErrorKind::PermissionDenied
        | ExecutionErrorKind::QuotaExceeded
        | ExecutionErrorKind::ResourceConflict
        | ExecutionErrorKind::Unknown => AttemptOutcome::FatalFailure,
    }
}

/// One pluggable execution backend.
///
/// The orchestrator calls these methods and only these methods. New
/// backends are added by implementing this trait, never by branching on
/// backend type inside the orchestrator.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Stable identifier for this strategy (e.g., "terraform", "aws_cli").
    fn id(&self) -> &str;

    /// The kind of backend behind this strategy.
    fn kind(&self) -> StrategyKind;

    /// Whether this strategy can execute the given context.
    async fn can_handle(&self, ctx: &ExecutionContext) -> bool;

    /// Estimated monetary cost of executing the given context.
    fn estimate_cost(&self, ctx: &ExecutionContext) -> f64;

    /// Execute the context against the backend.
    async fn execute(&self, ctx: &ExecutionContext) -> ExecutionResult;

    /// Check that a nominally successful result actually took effect.
    async fn validate(&self, result: &ExecutionResult) -> bool;

    /// Best-effort teardown of the resources named in `result`.
    /// Returns true if all of them were removed.
    async fn rollback(&self, result: &ExecutionResult) -> bool;
}

impl std::fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}
