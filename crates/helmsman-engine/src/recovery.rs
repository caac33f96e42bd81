//! Crash recovery.
//!
//! Objectives left IN_PROGRESS by a dead process are found by scanning
//! the store at startup. Depending on the configured policy they are
//! either resumed (re-entering selection so that prior failures re-rank
//! the chain) or marked failed.

use helmsman_core::{HelmsmanError, Objective, ObjectiveStatus, Result};
use helmsman_store::AuditEventType;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::orchestrator::Orchestrator;

/// What to do with objectives found IN_PROGRESS at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Re-enter the attempt loop from the last durable state.
    #[default]
    Resume,
    /// Mark the objective failed with an "interrupted" detail.
    MarkFailed,
}

impl Orchestrator {
    /// Scan for interrupted objectives and apply the recovery policy.
    ///
    /// Returns the objectives that were handled, in scan order. A
    /// resumption failure is recorded on its objective and does not
    /// abort recovery of the others.
    pub async fn recover(&self) -> Result<Vec<Objective>> {
        let interrupted = self.store.list(Some(ObjectiveStatus::InProgress)).await?;
        if interrupted.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            "Recovery: {} interrupted objective(s) found, policy {:?}",
            interrupted.len(),
            self.config.recovery
        );

        let mut handled = Vec::with_capacity(interrupted.len());
        for objective in interrupted {
            match self.config.recovery {
                RecoveryPolicy::MarkFailed => {
                    let failed = self
                        .store
                        .update(
                            objective.id,
                            Box::new(|o| {
                                o.error = Some("interrupted by process restart".to_string());
                                o.transition_to(ObjectiveStatus::Failed)
                            }),
                        )
                        .await?;
                    self.audit(
                        objective.id,
                        AuditEventType::Recovered,
                        "marked failed after restart",
                    )
                    .await;
                    handled.push(failed);
                }
                RecoveryPolicy::Resume => {
                    self.audit(objective.id, AuditEventType::Recovered, "resumed after restart")
                        .await;
                    match self.resume(objective.id).await {
                        Ok(resumed) => handled.push(resumed),
                        Err(err) => {
                            warn!("Resumption of objective {} failed: {}", objective.id, err);
                            handled.push(self.store.load(objective.id).await?);
                        }
                    }
                }
            }
        }

        Ok(handled)
    }

    /// Re-enter the attempt loop for an interrupted objective.
    ///
    /// Selection runs again over the persisted attempt history, so
    /// strategies that already failed are demoted and strategies that
    /// already spent their retry budget are skipped.
    pub async fn resume(&self, id: Uuid) -> Result<Objective> {
        let objective = self.store.load(id).await?;
        if objective.status != ObjectiveStatus::InProgress {
            return Err(HelmsmanError::Internal(format!(
                "objective {} is {:?}, not resumable",
                id, objective.status
            )));
        }

        info!(
            "Resuming objective {} with {} persisted attempt(s)",
            id,
            objective.attempts.len()
        );
        self.drive(id).await
    }
}
