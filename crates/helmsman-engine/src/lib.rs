//! # Helmsman Engine
//!
//! The execution orchestrator: turns a structured intent into a
//! supervised, cost-gated, fault-tolerant execution against one of
//! several pluggable backends.
//!
//! - [`Orchestrator`] - budget gating, strategy selection, the
//!   retry/fallback attempt loop, best-effort rollback
//! - [`RetryPolicy`] - exponential backoff with jitter
//! - [`RecoveryPolicy`] - handling of objectives interrupted by a crash
//! - [`CancelToken`] - cooperative cancellation between attempts

pub mod cancel;
pub mod orchestrator;
pub mod recovery;
pub mod retry;

#[cfg(test)]
pub(crate) mod support;

pub use cancel::CancelToken;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use recovery::RecoveryPolicy;
pub use retry::{RetryPolicy, JITTER_FRACTION};
