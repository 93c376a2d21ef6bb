//! Local snapshot persistence
//!
//! The snapshot is the on-device copy of the journal cache, read at start-up
//! and rewritten after every cache change. On disk it is a JSON object keyed
//! by `"<month>-<dayNumber>"`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{JournalError, Result};
use crate::types::JournalCache;

/// Persistence for the journal cache.
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot. Unreadable snapshots load as empty.
    fn load(&self) -> JournalCache;

    /// Replace the snapshot with `cache`.
    fn save(&self, cache: &JournalCache) -> Result<()>;
}

/// Snapshot stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<JournalCache> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| JournalError::io(&self.path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> JournalCache {
        if !self.path.exists() {
            return JournalCache::new();
        }

        match self.read() {
            Ok(cache) => {
                debug!(path = %self.path.display(), entries = cache.len(), "Loaded snapshot");
                cache
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse local entries");
                JournalCache::new()
            }
        }
    }

    fn save(&self, cache: &JournalCache) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| JournalError::io(parent, e))?;
        }

        // Atomic replace via a temp file
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string(cache)?;
        std::fs::write(&tmp, content).map_err(|e| JournalError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| JournalError::io(&self.path, e))?;
        Ok(())
    }
}

/// In-memory snapshot.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    cache: Mutex<JournalCache>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot pre-populated with `cache`.
    pub fn with_cache(cache: JournalCache) -> Self {
        Self {
            cache: Mutex::new(cache),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> JournalCache {
        self.cache.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn save(&self, cache: &JournalCache) -> Result<()> {
        if let Ok(mut guard) = self.cache.lock() {
            *guard = cache.clone();
        }
        Ok(())
    }
}
