//! Objective store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use helmsman_core::{
    AttemptRecord, HelmsmanError, Intent, Objective, ObjectiveStatus, Result,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A one-shot mutation applied inside an atomic read-modify-write.
pub type Mutator = Box<dyn FnOnce(&mut Objective) -> Result<()> + Send>;

/// Trait for objective stores.
///
/// Every `update` is durable before the call returns; a write failure
/// surfaces as [`HelmsmanError::Persistence`] and the in-memory objective
/// is not considered committed. Updates to the same objective from the
/// same process are serialized; cross-process writers are out of scope.
#[async_trait]
pub trait ObjectiveStore: Send + Sync {
    /// Create and persist a new objective in the Pending state.
    async fn create(&self, request: &str, intent: Intent) -> Result<Objective>;

    /// Load an objective by id.
    async fn load(&self, id: Uuid) -> Result<Objective>;

    /// Atomically read, mutate and persist an objective. The mutator runs
    /// under the objective's write lock; if it errors, nothing is
    /// persisted.
    async fn update(&self, id: Uuid, mutator: Mutator) -> Result<Objective>;

    /// List objectives, most recent first, optionally filtered by status.
    async fn list(&self, status: Option<ObjectiveStatus>) -> Result<Vec<Objective>>;

    /// Append an attempt record to an objective.
    async fn append_attempt(&self, id: Uuid, attempt: AttemptRecord) -> Result<Objective>;

    /// Delete an objective. Explicit administrative action (retention
    /// cleanup), never called implicitly.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// In-memory implementation of [`ObjectiveStore`], used in tests and for
/// ephemeral embedding.
pub struct InMemoryObjectiveStore {
    objectives: Arc<RwLock<HashMap<Uuid, Objective>>>,
}

impl InMemoryObjectiveStore {
    /// Create a new in-memory objective store.
    pub fn new() -> Self {
        Self {
            objectives: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryObjectiveStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectiveStore for InMemoryObjectiveStore {
    async fn create(&self, request: &str, intent: Intent) -> Result<Objective> {
        let objective = Objective::new(request, intent);
        let mut objectives = self.objectives.write().await;
        objectives.insert(objective.id, objective.clone());
        Ok(objective)
    }

    async fn load(&self, id: Uuid) -> Result<Objective> {
        let objectives = self.objectives.read().await;
        objectives
            .get(&id)
            .cloned()
            .ok_or(HelmsmanError::NotFound { id })
    }

    async fn update(&self, id: Uuid, mutator: Mutator) -> Result<Objective> {
        let mut objectives = self.objectives.write().await;
        let objective = objectives
            .get_mut(&id)
            .ok_or(HelmsmanError::NotFound { id })?;

        // Mutate a copy so a failing mutator leaves the stored record
        // untouched.
        let mut updated = objective.clone();
        mutator(&mut updated)?;
        updated.touch();
        *objective = updated.clone();
        Ok(updated)
    }

    async fn list(&self, status: Option<ObjectiveStatus>) -> Result<Vec<Objective>> {
        let objectives = self.objectives.read().await;
        let mut result: Vec<Objective> = objectives
            .values()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn append_attempt(&self, id: Uuid, attempt: AttemptRecord) -> Result<Objective> {
        self.update(
            id,
            Box::new(move |objective| {
                objective.record_attempt(attempt);
                Ok(())
            }),
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut objectives = self.objectives.write().await;
        objectives
            .remove(&id)
            .map(|_| ())
            .ok_or(HelmsmanError::NotFound { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helmsman_core::AttemptOutcome;

    fn intent() -> Intent {
        Intent::builder().operation("provision_vm").build().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let store = InMemoryObjectiveStore::new();
        let objective = store.create("provision a vm", intent()).await.unwrap();

        let loaded = store.load(objective.id).await.unwrap();
        assert_eq!(loaded.id, objective.id);
        assert_eq!(loaded.status, ObjectiveStatus::Pending);
    }

    #[tokio::test]
    async fn test_load_missing() {
        let store = InMemoryObjectiveStore::new();
        let err = store.load(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, HelmsmanError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_is_atomic_on_mutator_error() {
        let store = InMemoryObjectiveStore::new();
        let objective = store.create("req", intent()).await.unwrap();

        let result = store
            .update(
                objective.id,
                Box::new(|o| {
                    o.estimated_cost = 999.0;
                    Err(HelmsmanError::Internal("mutator failed".into()))
                }),
            )
            .await;
        assert!(result.is_err());

        // The failed mutation must not be observable.
        let loaded = store.load(objective.id).await.unwrap();
        assert_eq!(loaded.estimated_cost, 0.0);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = InMemoryObjectiveStore::new();
        let first = store.create("first", intent()).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
        let second = store.create("second", intent()).await.unwrap();

        store
            .update(
                first.id,
                Box::new(|o| o.transition_to(ObjectiveStatus::InProgress)),
            )
            .await
            .unwrap();

        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
        // Most recent first.
        assert_eq!(all[0].id, second.id);

        let in_progress = store.list(Some(ObjectiveStatus::InProgress)).await.unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, first.id);
    }

    #[tokio::test]
    async fn test_append_attempt() {
        let store = InMemoryObjectiveStore::new();
        let objective = store.create("req", intent()).await.unwrap();

        let updated = store
            .append_attempt(
                objective.id,
                AttemptRecord::new("aws_cli", 1, AttemptOutcome::Success)
                    .with_resources(vec!["vm-1".into()]),
            )
            .await
            .unwrap();

        assert_eq!(updated.attempts.len(), 1);
        assert_eq!(updated.resources_created, vec!["vm-1"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryObjectiveStore::new();
        let objective = store.create("req", intent()).await.unwrap();
        store.delete(objective.id).await.unwrap();
        assert!(store.load(objective.id).await.is_err());
    }
}
