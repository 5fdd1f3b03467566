use super::{StorageBackend, StorageError};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// An in-memory backend for tests and ephemeral deployments.
///
/// Clones share the same underlying map.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Backend("memory backend lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write_batch(&self, batch: Vec<(String, Vec<u8>)>) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Backend("memory backend lock poisoned".to_string()))?;
        entries.extend(batch);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Backend("memory backend lock poisoned".to_string()))?;
        Ok(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}
