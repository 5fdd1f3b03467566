use super::{StorageBackend, StorageError};
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single JSON document holding every entry, values base64 encoded.
///
/// Batches are written to a sibling temp file and renamed into place, so a
/// crash leaves either the old or the new document.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Open (or lazily create) the state document at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, Vec<u8>>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let encoded: BTreeMap<String, String> = serde_json::from_str(&content)?;
        encoded
            .into_iter()
            .map(|(key, value)| {
                BASE64_ENGINE
                    .decode(value.as_bytes())
                    .map(|bytes| (key.clone(), bytes))
                    .map_err(|e| StorageError::Backend(format!("corrupt entry {}: {}", key, e)))
            })
            .collect()
    }

    fn store(&self, entries: &BTreeMap<String, Vec<u8>>) -> Result<(), StorageError> {
        let encoded: BTreeMap<&str, String> = entries
            .iter()
            .map(|(key, value)| (key.as_str(), BASE64_ENGINE.encode(value)))
            .collect();
        let content = serde_json::to_vec_pretty(&encoded)?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), entries = entries.len(), "state document written");
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn write_batch(&self, batch: Vec<(String, Vec<u8>)>) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        entries.extend(batch);
        self.store(&entries)
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        Ok(self.load()?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_backend_persists_batches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("committee.json");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.read("a").unwrap(), None);
        backend
            .write_batch(vec![("a".to_string(), b"one".to_vec()), ("b".to_string(), vec![0, 255])])
            .unwrap();

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.read("a").unwrap(), Some(b"one".to_vec()));
        assert_eq!(reopened.read("b").unwrap(), Some(vec![0, 255]));
        assert_eq!(reopened.entries().unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_document_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("committee.json");
        fs::write(&path, "not json").unwrap();

        let backend = FileBackend::open(&path).unwrap();
        assert!(matches!(backend.read("a"), Err(StorageError::Serialization(_))));
    }
}
