//! Local snapshot cache for restart and offline resilience.
//!
//! Two best-effort JSON blobs live under the configured cache directory:
//! the last-known stores list and the active shift snapshot. Neither
//! carries a schema version. Failures to read or write are logged and
//! swallowed; a missing or unreadable snapshot simply reads as absent.

use crate::entities::{shift, store};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const STORES_SNAPSHOT: &str = "stores.json";
const SHIFT_SNAPSHOT: &str = "shift.json";

/// Best-effort JSON snapshot store.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    /// Creates a cache rooted at `dir`, creating the directory if needed.
    /// A failure to create the directory is logged; subsequent saves will
    /// simply fail soft.
    #[must_use]
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("Could not create cache directory {}: {e}", dir.display());
        }
        Self { dir }
    }

    /// Persists the last-known stores list.
    pub fn save_stores(&self, stores: &[store::Model]) {
        self.save(STORES_SNAPSHOT, stores);
    }

    /// Loads the last-known stores list; empty when absent or unreadable.
    #[must_use]
    pub fn load_stores(&self) -> Vec<store::Model> {
        self.load(STORES_SNAPSHOT).unwrap_or_default()
    }

    /// Persists the active shift snapshot for crash/restart recovery.
    pub fn save_shift(&self, current: &shift::Model) {
        self.save(SHIFT_SNAPSHOT, current);
    }

    /// Loads the active shift snapshot, if one was saved.
    #[must_use]
    pub fn load_shift(&self) -> Option<shift::Model> {
        self.load(SHIFT_SNAPSHOT)
    }

    /// Removes the shift snapshot after a shift has closed.
    pub fn clear_shift(&self) {
        let path = self.dir.join(SHIFT_SNAPSHOT);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Could not clear shift snapshot: {e}");
            }
        }
    }

    fn save<T: serde::Serialize + ?Sized>(&self, file: &str, value: &T) {
        let path = self.dir.join(file);
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!("Could not write cache snapshot {}: {e}", path.display());
                } else {
                    info!("Cached snapshot {}", path.display());
                }
            }
            Err(e) => warn!("Could not serialize cache snapshot {file}: {e}"),
        }
    }

    fn load<T: serde::de::DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.dir.join(file);
        let contents = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable cache snapshot {}: {e}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::Utc;

    fn test_cache() -> (LocalCache, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (LocalCache::new(dir.path()), dir)
    }

    #[test]
    fn test_stores_snapshot_round_trip() {
        let (cache, _dir) = test_cache();
        let stores = vec![store::Model {
            id: 1,
            name: "Main".to_string(),
            address: Some("12 Main St".to_string()),
            phone: None,
            created_at: Utc::now(),
        }];

        cache.save_stores(&stores);
        assert_eq!(cache.load_stores(), stores);
    }

    #[test]
    fn test_missing_snapshots_read_as_absent() {
        let (cache, _dir) = test_cache();
        assert!(cache.load_stores().is_empty());
        assert!(cache.load_shift().is_none());
    }

    #[test]
    fn test_shift_snapshot_save_and_clear() {
        let (cache, _dir) = test_cache();
        let current = shift::Model {
            id: 3,
            store_id: 1,
            user_id: 7,
            start_time: Utc::now(),
            end_time: None,
            is_active: true,
            total_sales: 0.0,
            created_at: Utc::now(),
        };

        cache.save_shift(&current);
        assert_eq!(cache.load_shift().map(|s| s.id), Some(3));

        cache.clear_shift();
        assert!(cache.load_shift().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_discarded() {
        let (cache, dir) = test_cache();
        std::fs::write(dir.path().join(SHIFT_SNAPSHOT), "{not json").unwrap();
        assert!(cache.load_shift().is_none());
    }
}
