use std::io::Write;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::models::Registry;
use super::errors::RepositoryError;
use super::patient::PatientStore;

/// Registry store backed by a single JSON file.
///
/// The file root is an object mapping patient ids to attribute objects.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for the given file. The file is not touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the backing file holding an empty registry if it does not exist yet.
    /// Returns `true` when a new file was written.
    pub async fn ensure_exists(&self) -> Result<bool, RepositoryError> {
        if tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| RepositoryError::io(&self.path, e))?
        {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::io(parent, e))?;
        }

        info!("Creating empty patient registry at {}", self.path.display());
        self.save(&Registry::new()).await?;
        Ok(true)
    }

    /// Directory holding the backing file, where staging files are created
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// Write `contents` to a fresh staging file next to `path`, then rename it over `path`.
///
/// Every call stages into its own uniquely named file, so concurrent saves
/// never share a partially written file and the last rename wins.
fn write_atomically(directory: &Path, path: &Path, contents: &[u8]) -> Result<(), RepositoryError> {
    let mut staging =
        NamedTempFile::new_in(directory).map_err(|e| RepositoryError::io(directory, e))?;
    staging
        .write_all(contents)
        .and_then(|()| staging.as_file().sync_all())
        .map_err(|e| RepositoryError::io(directory, e))?;
    staging
        .persist(path)
        .map_err(|e| RepositoryError::io(path, e.error))?;
    Ok(())
}

#[async_trait]
impl PatientStore for JsonFileStore {
    async fn load(&self) -> Result<Registry, RepositoryError> {
        debug!("Loading patient registry from {}", self.path.display());

        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|e| RepositoryError::io(&self.path, e))?;

        Ok(serde_json::from_slice(&contents)?)
    }

    async fn save(&self, registry: &Registry) -> Result<(), RepositoryError> {
        debug!(
            "Saving {} patients to {}",
            registry.len(),
            self.path.display()
        );

        let contents = serde_json::to_vec(registry)?;
        let directory = self.directory().to_path_buf();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&directory, &path, &contents))
            .await
            .map_err(|e| RepositoryError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("patients.json"));

        let result = store.load().await;
        assert!(matches!(result, Err(RepositoryError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        let result = store.load().await;
        assert!(matches!(result, Err(RepositoryError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.json");
        std::fs::write(
            &path,
            r#"{"P002": {"name": "Neha", "city": "Pune"}, "P001": {"name": "Amit", "city": "Delhi"}}"#,
        )
        .unwrap();

        let store = JsonFileStore::new(&path);
        let mut registry = store.load().await.unwrap();
        registry.shift_remove("P002");
        registry.insert(
            "P003".to_string(),
            json!({ "name": "Kiran" }).as_object().cloned().unwrap(),
        );
        store.save(&registry).await.unwrap();

        let reloaded = store.load().await.unwrap();
        let ids: Vec<&str> = reloaded.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["P001", "P003"]);
        assert_eq!(reloaded["P001"]["city"], json!("Delhi"));

        // No staging files are left behind
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw["P001"].get("id").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_leave_a_complete_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("patients.json"));
        store.ensure_exists().await.unwrap();

        for round in 0..25 {
            let mut tasks = tokio::task::JoinSet::new();
            for writer in 0..8 {
                let store = store.clone();
                tasks.spawn(async move {
                    let mut registry = Registry::new();
                    for n in 0..=writer {
                        registry.insert(
                            format!("P{:03}", n),
                            json!({ "name": format!("writer {} round {}", writer, round) })
                                .as_object()
                                .cloned()
                                .unwrap(),
                        );
                    }
                    store.save(&registry).await
                });
            }
            while let Some(result) = tasks.join_next().await {
                result.unwrap().unwrap();
            }

            let registry = store.load().await.unwrap();
            assert!((1..=8).contains(&registry.len()));
        }

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_exists_creates_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("patients.json"));

        assert!(store.ensure_exists().await.unwrap());
        assert!(store.load().await.unwrap().is_empty());

        // Second call leaves the file alone
        assert!(!store.ensure_exists().await.unwrap());
    }
}
