//! Snapshot persistence
//!
//! The snapshot lives under a single key as one serialized blob. Writes
//! replace the whole blob; there is no merge and no versioning.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::error::{AnalyticsError, AnalyticsResult};
use super::types::Snapshot;

/// Key-addressed storage for the analytics snapshot
pub trait SnapshotStore: Send + Sync {
    /// Read the stored snapshot, or `None` if nothing was ever written
    fn load(&self) -> AnalyticsResult<Option<Snapshot>>;

    /// Replace the stored snapshot
    fn save(&self, snapshot: &Snapshot) -> AnalyticsResult<()>;
}

/// File-backed store: `{data_dir}/{key}.json`
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for `key` inside `data_dir`
    pub fn new(data_dir: impl AsRef<Path>, key: &str) -> AnalyticsResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        Ok(Self {
            path: data_dir.join(format!("{}.json", key)),
        })
    }

    /// Location of the blob on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> AnalyticsResult<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let snapshot: Snapshot = serde_json::from_reader(reader).map_err(|e| {
            AnalyticsError::Serialization(format!(
                "Failed to load snapshot from {:?}: {}",
                self.path, e
            ))
        })?;

        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> AnalyticsResult<()> {
        // Write to a sibling temp file first so readers never see a torn blob
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, snapshot)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(path = ?self.path, "Snapshot written");
        Ok(())
    }
}

/// In-memory store holding the serialized blob
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a raw blob (which may be malformed)
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> AnalyticsResult<Option<Snapshot>> {
        let blob = self
            .blob
            .lock()
            .map_err(|e| AnalyticsError::Lock(format!("Failed to acquire store lock: {}", e)))?;

        match blob.as_deref() {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> AnalyticsResult<()> {
        let text = serde_json::to_string(snapshot)?;
        let mut blob = self
            .blob
            .lock()
            .map_err(|e| AnalyticsError::Lock(format!("Failed to acquire store lock: {}", e)))?;
        *blob = Some(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::service::initial_data;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn sample() -> Snapshot {
        initial_data(Utc::now(), &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_file_store_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), "analytics").unwrap();
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.path(), dir.path().join("analytics.json"));
    }

    #[test]
    fn test_file_store_overwrites_whole_blob() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), "analytics").unwrap();

        let first = sample();
        store.save(&first).unwrap();

        let mut second = sample();
        second.top_pages.truncate(1);
        second.revenue_data.clear();
        store.save(&second).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, second);
        assert!(!dir.path().join("analytics.json.tmp").exists());
    }

    #[test]
    fn test_file_store_corrupt_blob() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("analytics.json"), "{ not json").unwrap();
        let store = FileStore::new(dir.path(), "analytics").unwrap();
        assert!(matches!(store.load(), Err(AnalyticsError::Serialization(_))));
    }

    #[test]
    fn test_memory_store_last_writer_wins() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let mut a = sample();
        a.kpis.revenue.value = 1.0;
        let mut b = sample();
        b.kpis.revenue.value = 2.0;

        store.save(&a).unwrap();
        store.save(&b).unwrap();
        assert_eq!(store.load().unwrap().unwrap().kpis.revenue.value, 2.0);
    }

    #[test]
    fn test_memory_store_malformed_blob() {
        let store = MemoryStore::with_blob("[1, 2");
        assert!(store.load().is_err());
    }
}
