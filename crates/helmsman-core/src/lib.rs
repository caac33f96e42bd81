//! # Helmsman Core
//!
//! Core primitives and types for the Helmsman orchestration engine.
//!
//! This crate provides the fundamental building blocks:
//! - [`Intent`] - Structured description of a desired operation
//! - [`Objective`] - Persisted unit of work with a strict state machine
//! - [`Strategy`] - Interface every execution backend implements
//! - [`HelmsmanError`] - Engine error taxonomy

pub mod error;
pub mod intent;
pub mod objective;
pub mod strategy;
pub mod types;

// Re-exports for convenience
pub use error::{HelmsmanError, Result};
pub use intent::{Intent, IntentBuilder};
pub use objective::{AttemptRecord, Objective};
pub use strategy::{
    classify, ExecutionContext, ExecutionError, ExecutionErrorKind, ExecutionResult, Strategy,
};
pub use types::{AlertLevel, AttemptOutcome, ObjectiveStatus, StrategyKind};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{HelmsmanError, Result};
    pub use crate::intent::{Intent, IntentBuilder};
    pub use crate::objective::{AttemptRecord, Objective};
    pub use crate::strategy::{
        classify, ExecutionContext, ExecutionError, ExecutionErrorKind, ExecutionResult, Strategy,
    };
    pub use crate::types::{AlertLevel, AttemptOutcome, ObjectiveStatus, StrategyKind};
}
