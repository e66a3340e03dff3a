//! Prompt version snapshots
//!
//! A flow with versioning enabled writes one [`PromptVersion`] per run to
//! `{store_path}/{id}.json`. The id is fixed for the lifetime of the flow, so
//! every run overwrites the same file and only the latest template/options
//! pair is retained.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FlowError;
use crate::types::RunOptions;

/// Default directory for snapshot files.
pub const DEFAULT_STORE_PATH: &str = "./prompt-versions";

/// Versioning configuration for a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersioningOptions {
    pub versioning_enabled: bool,
    pub store_path: PathBuf,
}

impl Default for VersioningOptions {
    fn default() -> Self {
        Self {
            versioning_enabled: false,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl VersioningOptions {
    /// Versioning on, writing under `store_path`.
    pub fn enabled(store_path: impl Into<PathBuf>) -> Self {
        Self {
            versioning_enabled: true,
            store_path: store_path.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

/// One persisted snapshot of a flow's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptVersion {
    pub id: Uuid,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub template: String,
    pub options: RunOptions,
}

/// Persistence for prompt snapshots.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Write `version`, replacing any snapshot with the same id.
    async fn save(&self, version: &PromptVersion) -> Result<(), FlowError>;

    /// Read a snapshot back; `Ok(None)` when it was never written.
    async fn load(&self, id: Uuid) -> Result<Option<PromptVersion>, FlowError>;
}

/// Stores each snapshot as pretty-printed JSON in a directory.
#[derive(Debug, Clone)]
pub struct FileVersionStore {
    dir: PathBuf,
}

impl FileVersionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl VersionStore for FileVersionStore {
    async fn save(&self, version: &PromptVersion) -> Result<(), FlowError> {
        let json = serde_json::to_string_pretty(version).map_err(|e| {
            FlowError::PersistenceError(format!("Failed to serialize prompt version: {e}"))
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            FlowError::PersistenceError(format!(
                "Failed to create version directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let path = self.path_for(version.id);
        tokio::fs::write(&path, json).await.map_err(|e| {
            FlowError::PersistenceError(format!("Failed to write {}: {e}", path.display()))
        })?;

        tracing::debug!(
            version_id = %version.id,
            timestamp = version.timestamp,
            path = %path.display(),
            "prompt version saved"
        );
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<PromptVersion>, FlowError> {
        let path = self.path_for(id);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FlowError::PersistenceError(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        serde_json::from_str(&text).map(Some).map_err(|e| {
            FlowError::PersistenceError(format!("Corrupt prompt version {}: {e}", path.display()))
        })
    }
}

/// Millisecond timestamps that never repeat or go backwards.
#[derive(Debug, Default)]
pub(crate) struct SnapshotClock {
    last: AtomicI64,
}

impl SnapshotClock {
    pub(crate) fn next(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}
