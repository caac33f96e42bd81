//! File-backed objective store.
//!
//! One self-describing JSON document per objective, keyed by its id.
//! Writes go to a temp file in the same directory, are fsynced, and are
//! then atomically renamed into place: crash-consistency of the
//! objective state machine depends on no partial write ever being
//! observable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use helmsman_core::{
    AttemptRecord, HelmsmanError, Intent, Objective, ObjectiveStatus, Result,
};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::store::{Mutator, ObjectiveStore};

/// File-backed implementation of [`ObjectiveStore`].
pub struct FileObjectiveStore {
    root: PathBuf,
    // Per-objective write locks (single-writer discipline within the
    // process; cross-process writers are out of scope).
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl FileObjectiveStore {
    /// Open a store rooted at the given directory, creating it if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            tokio::fs::set_permissions(&root, perms).await?;
        }

        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn objective_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    fn temp_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!(".{}.json.tmp", id))
    }

    async fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Durably persist one objective: write-temp, fsync, atomic rename.
    async fn persist(&self, objective: &Objective) -> Result<()> {
        let temp = self.temp_path(objective.id);
        let target = self.objective_path(objective.id);

        let payload = serde_json::to_vec_pretty(objective)?;

        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(&payload).await?;
        file.sync_all().await?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&temp, perms).await?;
        }

        tokio::fs::rename(&temp, &target).await?;
        debug!("Persisted objective {} to {}", objective.id, target.display());
        Ok(())
    }

    async fn read(&self, id: Uuid) -> Result<Objective> {
        let path = self.objective_path(id);
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(HelmsmanError::NotFound { id });
            }
            Err(err) => return Err(err.into()),
        };

        serde_json::from_slice(&contents).map_err(|err| HelmsmanError::Persistence {
            message: format!("corrupt objective record {}: {}", id, err),
        })
    }
}

#[async_trait]
impl ObjectiveStore for FileObjectiveStore {
    async fn create(&self, request: &str, intent: Intent) -> Result<Objective> {
        let objective = Objective::new(request, intent);
        let lock = self.lock_for(objective.id).await;
        let _guard = lock.lock().await;
        self.persist(&objective).await?;
        Ok(objective)
    }

    async fn load(&self, id: Uuid) -> Result<Objective> {
        self.read(id).await
    }

    async fn update(&self, id: Uuid, mutator: Mutator) -> Result<Objective> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut objective = self.read(id).await?;
        mutator(&mut objective)?;
        objective.touch();
        // Durable before the call returns; on failure the caller must not
        // advance logical state.
        self.persist(&objective).await?;
        Ok(objective)
    }

    async fn list(&self, status: Option<ObjectiveStatus>) -> Result<Vec<Objective>> {
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        let mut result = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let is_record = path.extension().map_or(false, |ext| ext == "json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }

            let contents = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Objective>(&contents) {
                Ok(objective) => {
                    if status.map_or(true, |s| objective.status == s) {
                        result.push(objective);
                    }
                }
                Err(err) => {
                    tracing::warn!("Skipping corrupt record {}: {}", path.display(), err);
                }
            }
        }

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
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        match tokio::fs::remove_file(self.objective_path(id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(HelmsmanError::NotFound { id })
            }
            Err(err) => Err(err.into()),
        }
    }
}
