//! # Helmsman Selector
//!
//! Multi-criteria strategy selection: every registered
//! [`Strategy`](helmsman_core::Strategy) is scored against an
//! [`ExecutionContext`](helmsman_core::ExecutionContext), filtered by
//! capability, and ordered into a primary + fallback chain with explicit
//! constant weights.

pub mod score;
pub mod selector;

pub use score::{
    StrategyScore, COST_PENALTY_PER_DOLLAR, PREFERENCE_BONUS, PRIOR_FAILURE_PENALTY,
};
pub use selector::StrategySelector;
