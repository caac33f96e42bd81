//! Budget monitor: cumulative allow/warn/block gating.
//!
//! Budgets are cumulative, not per-request: historical spend across
//! prior objectives in the same scope is added to the new estimate
//! before thresholding.

use std::sync::Arc;

use helmsman_core::{AlertLevel, Objective};
use helmsman_store::ObjectiveStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::pricing::CostEstimate;

/// Fraction of the limit at which a decision escalates to Warning.
pub const WARNING_THRESHOLD: f64 = 0.5;
/// Fraction of the limit at which a decision escalates to Critical.
pub const CRITICAL_THRESHOLD: f64 = 0.8;
/// Fraction of the limit at which execution is blocked.
pub const EXCEEDED_THRESHOLD: f64 = 1.0;

/// Budget limits, read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Global monthly limit.
    pub monthly_limit: f64,

    /// Per-scope overrides; an override takes precedence over the global
    /// limit for objectives in that scope.
    #[serde(default)]
    pub scope_overrides: HashMap<String, f64>,
}

impl BudgetConfig {
    /// Create a config with a global monthly limit.
    pub fn with_limit(monthly_limit: f64) -> Self {
        Self {
            monthly_limit,
            scope_overrides: HashMap::new(),
        }
    }

    /// Add a per-scope override.
    pub fn with_scope_override(mut self, scope: impl Into<String>, limit: f64) -> Self {
        self.scope_overrides.insert(scope.into(), limit);
        self
    }

    /// The limit applying to the given scope.
    pub fn limit_for(&self, scope: Option<&str>) -> f64 {
        scope
            .and_then(|s| self.scope_overrides.get(s))
            .copied()
            .unwrap_or(self.monthly_limit)
    }
}

/// The monitor's verdict on one estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetDecision {
    /// False if execution must be blocked before any attempt.
    pub allowed: bool,

    /// The monthly estimate that was checked.
    pub estimated_cost: f64,

    /// Historical spend included in the projection.
    pub historical_spend: f64,

    /// The limit the projection was checked against.
    pub limit: f64,

    /// Projected spend as a fraction of the limit.
    pub percentage_of_limit: f64,

    /// Severity of the decision.
    pub alert_level: AlertLevel,

    /// True if historical spend could not be computed and the monitor
    /// failed open.
    pub degraded: bool,
}

/// Budget monitor over an objective store.
pub struct BudgetMonitor {
    store: Arc<dyn ObjectiveStore>,
    config: BudgetConfig,
}

impl BudgetMonitor {
    /// Create a monitor over the given store and limits.
    pub fn new(store: Arc<dyn ObjectiveStore>, config: BudgetConfig) -> Self {
        Self { store, config }
    }

    /// The configured limits.
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Check an estimate for an objective against the configured limits
    /// plus historical spend in the objective's scope.
    ///
    /// If historical spend cannot be computed (store unavailable) the
    /// monitor fails open on the historical component only: the estimate
    /// is still thresholded by itself, and the decision is at least
    /// Warning so that the degradation is visible.
    pub async fn check(&self, objective: &Objective, estimate: &CostEstimate) -> BudgetDecision {
        let scope = objective.intent.parameter_str("scope").map(|s| s.to_string());
        let limit = self.config.limit_for(scope.as_deref());

        let (historical, degraded) = match self.historical_spend(objective, scope.as_deref()).await {
            Ok(spend) => (spend, false),
            Err(err) => {
                warn!(
                    "Budget check degraded for objective {}: historical spend unavailable ({})",
                    objective.id, err
                );
                (0.0, true)
            }
        };

        let projected = estimate.monthly + historical;
        let percentage = if limit > 0.0 {
            projected / limit
        } else if projected > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let mut alert_level = if percentage >= EXCEEDED_THRESHOLD {
            AlertLevel::Exceeded
        } else if percentage >= CRITICAL_THRESHOLD {
            AlertLevel::Critical
        } else if percentage >= WARNING_THRESHOLD {
            AlertLevel::Warning
        } else {
            AlertLevel::Ok
        };
        // Failing open covers only the missing history: the estimate by
        // itself can still block, and a degraded decision is never Ok.
        if degraded && alert_level == AlertLevel::Ok {
            alert_level = AlertLevel::Warning;
        }

        BudgetDecision {
            allowed: alert_level != AlertLevel::Exceeded,
            estimated_cost: estimate.monthly,
            historical_spend: historical,
            limit,
            percentage_of_limit: percentage,
            alert_level,
            degraded,
        }
    }

    /// Sum of `total_cost` across prior objectives in the same scope.
    async fn historical_spend(
        &self,
        objective: &Objective,
        scope: Option<&str>,
    ) -> helmsman_core::Result<f64> {
        let objectives = self.store.list(None).await?;
        Ok(objectives
            .iter()
            .filter(|o| o.id != objective.id)
            .filter(|o| match scope {
                Some(scope) => o.intent.parameter_str("scope") == Some(scope),
                None => true,
            })
            .map(|o| o.total_cost)
            .sum())
    }
}
