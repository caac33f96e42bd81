//! Strategy scoring.
//!
//! All weights are explicit constants so that selection is reproducible
//! and testable.

use helmsman_core::{ExecutionContext, Strategy, StrategyKind};
use serde::{Deserialize, Serialize};

/// Score penalty per dollar of estimated monthly cost.
pub const COST_PENALTY_PER_DOLLAR: f64 = 0.0005;

/// Score bonus when the strategy matches an explicit user preference.
pub const PREFERENCE_BONUS: f64 = 0.25;

/// Score penalty per failed prior attempt of the same objective. The
/// penalty strictly lowers rank but never removes a strategy: it may
/// still be retried after all others are exhausted.
pub const PRIOR_FAILURE_PENALTY: f64 = 0.3;

/// Ephemeral score of one strategy against a context. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyScore {
    /// The strategy that was scored.
    pub strategy_id: String,

    /// The kind of backend behind the strategy.
    pub kind: StrategyKind,

    /// Whether the strategy reported it can execute the context.
    pub can_handle: bool,

    /// The strategy's own cost estimate for the context.
    pub cost_estimate: f64,

    /// Composite priority score; higher is preferred.
    pub priority_score: f64,

    /// Non-empty only when `can_handle` is false.
    pub rejection_reasons: Vec<String>,
}

/// Score one strategy against a context.
///
/// The composite score is the static base priority of the strategy kind,
/// minus a penalty proportional to its cost estimate, plus a bonus for an
/// explicit user preference, minus a penalty per failed prior attempt.
pub async fn score_strategy(strategy: &dyn Strategy, ctx: &ExecutionContext) -> StrategyScore {
    let can_handle = strategy.can_handle(ctx).await;
    if !can_handle {
        return StrategyScore {
            strategy_id: strategy.id().to_string(),
            kind: strategy.kind(),
            can_handle: false,
            cost_estimate: 0.0,
            priority_score: f64::NEG_INFINITY,
            rejection_reasons: vec![format!(
                "strategy cannot handle operation '{}'",
                ctx.intent.operation
            )],
        };
    }

    let cost_estimate = strategy.estimate_cost(ctx);
    let mut score = strategy.kind().base_priority();
    score -= cost_estimate * COST_PENALTY_PER_DOLLAR;

    if ctx.preferred_strategy.as_deref() == Some(strategy.id()) {
        score += PREFERENCE_BONUS;
    }

    let prior_failures = ctx.prior_failures_for(strategy.id());
    score -= prior_failures as f64 * PRIOR_FAILURE_PENALTY;

    StrategyScore {
        strategy_id: strategy.id().to_string(),
        kind: strategy.kind(),
        can_handle: true,
        cost_estimate,
        priority_score: score,
        rejection_reasons: Vec::new(),
    }
}
