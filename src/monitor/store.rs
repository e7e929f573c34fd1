use crate::error::StateError;
use crate::models::Snapshot;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Durable home of the most recent snapshot
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` means no snapshot was ever saved.
    async fn read(&self) -> Result<Option<Snapshot>, StateError>;

    /// Replace the stored snapshot. On error the previous one stays readable.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StateError>;

    /// Like [`read`](Self::read), but an unreadable snapshot counts as absent
    /// so the next cycle re-establishes a baseline.
    async fn load(&self) -> Option<Snapshot> {
        match self.read().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(degraded = true, error = %e, "stored snapshot unusable, treating as absent");
                None
            }
        }
    }
}

/// Snapshot kept as a JSON array of ids in a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StateError {
        StateError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn read(&self) -> Result<Option<Snapshot>, StateError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        let snapshot = serde_json::from_str(&text).map_err(|source| StateError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(parent, e))?;
        }

        let json = serde_json::to_vec(snapshot)?;
        let temp = self.temp_path();

        // Temp file + rename: a crash mid-write leaves the last good file untouched
        if let Err(e) = write_synced(&temp, &json).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(self.io_error(&temp, e));
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(self.io_error(&self.path, e));
        }

        debug!(path = %self.path.display(), listings = snapshot.len(), "snapshot saved");
        Ok(())
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingId;

    fn snapshot(ids: &[&str]) -> Snapshot {
        ids.iter().map(|id| ListingId::parse(id).unwrap()).collect()
    }

    #[tokio::test]
    async fn missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        assert!(store.read().await.unwrap().is_none());
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn empty_array_is_present_but_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[]").unwrap();

        let loaded = JsonFileStore::new(&path).load().await;
        assert_eq!(loaded, Some(Snapshot::default()));
    }

    #[tokio::test]
    async fn save_then_load_and_parent_dirs_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("state.json");
        let store = JsonFileStore::new(&path);
        let snap = snapshot(&[
            "3f2504e0-4f89-11d3-9a0c-0305e82c3301",
            "00000000-0000-0000-0000-000000000001",
        ]);

        store.save(&snap).await.unwrap();

        assert_eq!(store.load().await, Some(snap));
        assert!(!store.temp_path().exists());
        let on_disk: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
    }

    #[tokio::test]
    async fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        store
            .save(&snapshot(&["00000000-0000-0000-0000-000000000001"]))
            .await
            .unwrap();
        let second = snapshot(&["00000000-0000-0000-0000-000000000002"]);
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await, Some(second));
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_error_and_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[\"3f2504e0-4f89").unwrap();
        let store = JsonFileStore::new(&path);

        assert!(matches!(store.read().await, Err(StateError::Corrupt { .. })));
        assert!(store.load().await.is_none());
        // left in place for inspection
        assert!(path.exists());
    }

    #[tokio::test]
    async fn non_canonical_ids_count_as_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"["booli_sodermalm_1"]"#).unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.read().await, Err(StateError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileStore::new(&path);
        let good = snapshot(&["00000000-0000-0000-0000-000000000001"]);
        store.save(&good).await.unwrap();

        // a directory squatting on the temp path makes the write fail
        std::fs::create_dir(store.temp_path()).unwrap();
        let result = store
            .save(&snapshot(&["00000000-0000-0000-0000-000000000002"]))
            .await;

        assert!(matches!(result, Err(StateError::Io { .. })));
        assert_eq!(store.load().await, Some(good));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn failed_write_removes_temp_file() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let good = snapshot(&["00000000-0000-0000-0000-000000000001"]);
        store.save(&good).await.unwrap();

        // every write through the temp path hits a full device
        std::os::unix::fs::symlink(full, store.temp_path()).unwrap();
        let result = store
            .save(&snapshot(&["00000000-0000-0000-0000-000000000002"]))
            .await;

        assert!(matches!(result, Err(StateError::Io { .. })));
        assert!(std::fs::symlink_metadata(store.temp_path()).is_err());
        assert_eq!(store.load().await, Some(good));
    }
}
