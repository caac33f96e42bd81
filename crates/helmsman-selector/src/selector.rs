//! Strategy selection: capability filter, scoring, deterministic
//! ordering into a primary + fallback chain.

use std::sync::Arc;

use helmsman_core::{ExecutionContext, HelmsmanError, Result, Strategy};
use tracing::{debug, info};

use crate::score::{score_strategy, StrategyScore};

/// Selects and orders strategies for execution.
///
/// Given the same attempts history and the same registered strategies,
/// `select` always returns the same ordered chain: there is no hidden
/// randomness in scoring or tie-breaking.
pub struct StrategySelector {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl StrategySelector {
    /// Create an empty selector.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Register a strategy.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        debug!("Registered strategy '{}' ({:?})", strategy.id(), strategy.kind());
        self.strategies.push(strategy);
    }

    /// The registered strategies, in registration order.
    pub fn strategies(&self) -> &[Arc<dyn Strategy>] {
        &self.strategies
    }

    /// Score every registered strategy against a context, capable or not.
    pub async fn score_all(&self, ctx: &ExecutionContext) -> Vec<StrategyScore> {
        let mut scores = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            scores.push(score_strategy(strategy.as_ref(), ctx).await);
        }
        scores
    }

    /// Build the ordered fallback chain for a context.
    ///
    /// Capable strategies are sorted descending by composite score; ties
    /// break on the static base priority of the strategy kind. An empty
    /// capable set raises [`HelmsmanError::NoStrategyFound`] naming the
    /// rejected strategies and their rejection reasons.
    pub async fn select(&self, ctx: &ExecutionContext) -> Result<Vec<Arc<dyn Strategy>>> {
        let scores = self.score_all(ctx).await;

        let (mut capable, rejected): (Vec<_>, Vec<_>) = scores
            .into_iter()
            .zip(self.strategies.iter().cloned())
            .partition(|(score, _)| score.can_handle);

        if capable.is_empty() {
            let detail = rejected
                .iter()
                .map(|(s, _)| format!("{}: {}", s.strategy_id, s.rejection_reasons.join("; ")))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(HelmsmanError::NoStrategyFound {
                detail: if detail.is_empty() {
                    "no strategies registered".to_string()
                } else {
                    detail
                },
            });
        }

        capable.sort_by(|(a, _), (b, _)| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    b.kind
                        .base_priority()
                        .partial_cmp(&a.kind.base_priority())
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        info!(
            "Selected chain for objective {}: [{}]",
            ctx.objective_id,
            capable
                .iter()
                .map(|(s, _)| format!("{} ({:.3})", s.strategy_id, s.priority_score))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(capable.into_iter().map(|(_, strategy)| strategy).collect())
    }
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new()
    }
}
