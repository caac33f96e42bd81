//! # Helmsman Store
//!
//! Durable persistence for [`Objective`](helmsman_core::Objective)
//! records, plus an append-only audit trail of state transitions.
//!
//! Two implementations of [`ObjectiveStore`] are provided:
//! - [`FileObjectiveStore`] - one JSON document per objective with
//!   atomic write-temp/fsync/rename semantics
//! - [`InMemoryObjectiveStore`] - for tests and ephemeral embedding

pub mod audit;
pub mod file;
pub mod store;

pub use audit::{AuditEvent, AuditEventType, AuditLog};
pub use file::FileObjectiveStore;
pub use store::{InMemoryObjectiveStore, Mutator, ObjectiveStore};
