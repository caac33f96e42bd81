//! # Helmsman Budget
//!
//! Cost estimation and cumulative budget gating.
//!
//! - [`CostEstimator`] - pure function from resource specs to a
//!   [`CostEstimate`] over a static [`PricingTable`] snapshot
//! - [`BudgetMonitor`] - compares an estimate (plus historical spend)
//!   against configured limits and yields a [`BudgetDecision`]

pub mod monitor;
pub mod pricing;

pub use monitor::{
    BudgetConfig, BudgetDecision, BudgetMonitor, CRITICAL_THRESHOLD, EXCEEDED_THRESHOLD,
    WARNING_THRESHOLD,
};
pub use pricing::{
    CostEstimate, CostEstimator, CostLine, PricingTable, ResourcePrice, ResourceSpec,
    HOURS_PER_MONTH,
};
