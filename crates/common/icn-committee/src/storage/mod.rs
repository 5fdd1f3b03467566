use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, trace};

mod file;
mod memory;
#[cfg(feature = "persistence")]
pub mod rocksdb;

pub use file::FileBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "persistence")]
pub use self::rocksdb::RocksDbBackend;

/// Errors that can occur when reading or writing persisted state
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Entry not found with key: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A persistence engine able to apply a batch of writes atomically.
pub trait StorageBackend: Send + Sync {
    /// Read the raw value stored under `key`
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Apply every entry of the batch, or none of them
    fn write_batch(&self, batch: Vec<(String, Vec<u8>)>) -> Result<(), StorageError>;

    /// Snapshot of all entries ordered by key
    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).read(key)
    }

    fn write_batch(&self, batch: Vec<(String, Vec<u8>)>) -> Result<(), StorageError> {
        (**self).write_batch(batch)
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        (**self).entries()
    }
}

/// The key-value view handed to committee components.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Read and decode a JSON value, `None` when the key is absent
    fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encode a value as JSON and store it
    fn set_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Persisted contract state shared by every invocation.
///
/// All access goes through [`StateStore::begin`], which serializes invocations:
/// a transaction holds the store gate until it is committed or dropped.
pub struct StateStore<B> {
    backend: B,
    gate: Mutex<()>,
}

impl<B: StorageBackend> StateStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            gate: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open a transaction for a single invocation
    pub fn begin(&self) -> Result<Transaction<'_, B>, StorageError> {
        let guard = self
            .gate
            .lock()
            .map_err(|_| StorageError::Backend("state store gate poisoned".to_string()))?;
        trace!("transaction opened");
        Ok(Transaction {
            backend: &self.backend,
            _guard: guard,
            pending: RefCell::new(BTreeMap::new()),
        })
    }

    /// SHA-256 over the ordered, length-prefixed entries of the committed state.
    pub fn state_hash(&self) -> Result<[u8; 32], StorageError> {
        let _guard = self
            .gate
            .lock()
            .map_err(|_| StorageError::Backend("state store gate poisoned".to_string()))?;
        Ok(hash_entries(&self.backend.entries()?))
    }
}

fn hash_entries(entries: &[(String, Vec<u8>)]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for (key, value) in entries {
        hasher.update((key.len() as u64).to_be_bytes());
        hasher.update(key.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value);
    }
    hasher.finalize().into()
}

/// Buffered writes of one invocation. Nothing reaches the backend until `commit`.
pub struct Transaction<'a, B> {
    backend: &'a B,
    _guard: MutexGuard<'a, ()>,
    pending: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl<'a, B: StorageBackend> Transaction<'a, B> {
    /// A key-prefixed view of this transaction
    pub fn namespace(&self, name: &'static str) -> Namespace<'_, Self> {
        Namespace::new(self, name)
    }

    /// Hash of the committed state this transaction started from; buffered writes are not included.
    pub fn state_hash(&self) -> Result<[u8; 32], StorageError> {
        Ok(hash_entries(&self.backend.entries()?))
    }

    /// Apply all buffered writes in a single batch
    pub fn commit(self) -> Result<(), StorageError> {
        let batch: Vec<(String, Vec<u8>)> = self.pending.into_inner().into_iter().collect();
        if batch.is_empty() {
            return Ok(());
        }
        debug!(entries = batch.len(), "committing transaction");
        self.backend.write_batch(batch)
    }
}

impl<B: StorageBackend> KeyValueStore for Transaction<'_, B> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(value) = self.pending.borrow().get(key) {
            return Ok(Some(value.clone()));
        }
        self.backend.read(key)
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.pending.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// A named region of the store; keys are stored as `<name>/<key>`.
pub struct Namespace<'a, S: ?Sized> {
    inner: &'a S,
    name: &'static str,
}

impl<'a, S: KeyValueStore + ?Sized> Namespace<'a, S> {
    pub fn new(inner: &'a S, name: &'static str) -> Self {
        Self { inner, name }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}/{}", self.name, key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Namespace<'_, S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(&self.scoped(key))
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.inner.set(&self.scoped(key), value)
    }
}
