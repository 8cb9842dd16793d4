//! Persisted snapshot of the forum's non-automatic groups.
//!
//! The snapshot spares a `/groups.json` request for every new embed id.
//! It is only refreshed when the cache is explicitly cleared.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::forum::Group;

/// Storage for the group snapshot.
#[async_trait]
pub trait GroupSnapshotStore: Send + Sync {
    /// The stored groups, or `None` if nothing has been stored yet.
    async fn load(&self) -> Option<Vec<Group>>;

    async fn save(&self, groups: &[Group]);

    async fn clear(&self);
}

/// Snapshot held in process memory.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    groups: RwLock<Option<Vec<Group>>>,
}

impl MemorySnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupSnapshotStore for MemorySnapshot {
    async fn load(&self) -> Option<Vec<Group>> {
        self.groups
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    async fn save(&self, groups: &[Group]) {
        *self
            .groups
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(groups.to_vec());
    }

    async fn clear(&self) {
        *self
            .groups
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

/// Snapshot stored as a JSON file, surviving process restarts.
///
/// Writes go to a sibling temp file that is renamed into place, so readers
/// never see a partial snapshot. I/O failures are logged and treated as an
/// empty snapshot so a broken file only costs an extra forum request.
#[derive(Debug)]
pub struct JsonFileSnapshot {
    path: PathBuf,
    writes: AtomicU64,
}

impl JsonFileSnapshot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: AtomicU64::new(0),
        }
    }

    /// Unique temp path next to the snapshot, e.g. `groups.json.1234-0.tmp`.
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "snapshot".into(), |name| name.to_string_lossy());
        let seq = self.writes.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_file_name(format!("{file_name}.{}-{seq}.tmp", std::process::id()))
    }

    async fn write_atomic(&self, json: String) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        if let Err(e) = tokio::fs::write(&temp, json).await {
            remove_quietly(&temp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            remove_quietly(&temp).await;
            return Err(e);
        }
        Ok(())
    }
}

async fn remove_quietly(path: &Path) {
    let _ = tokio::fs::remove_file(path).await;
}

#[async_trait]
impl GroupSnapshotStore for JsonFileSnapshot {
    async fn load(&self) -> Option<Vec<Group>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read group snapshot: {e}");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(groups) => Some(groups),
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring corrupt group snapshot: {e}");
                None
            }
        }
    }

    async fn save(&self, groups: &[Group]) {
        let json = match serde_json::to_string(groups) {
            Ok(json) => json,
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to encode group snapshot: {e}");
                return;
            }
        };
        match self.write_atomic(json).await {
            Ok(()) => debug!(path = %self.path.display(), count = groups.len(), "Saved group snapshot"),
            Err(e) => warn!(path = %self.path.display(), "Failed to write group snapshot: {e}"),
        }
    }

    async fn clear(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove group snapshot: {e}"),
        }
    }
}
