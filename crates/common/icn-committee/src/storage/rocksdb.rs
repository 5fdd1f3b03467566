use super::{StorageBackend, StorageError};
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

/// Column family holding committee contract state
const CF_STATE: &str = "committee_state";

/// RocksDB implementation of StorageBackend
pub struct RocksDbBackend {
    db: Arc<DB>,
}

impl RocksDbBackend {
    /// Open (or create) a RocksDB-backed state store
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let cfs = vec![ColumnFamilyDescriptor::new(CF_STATE, Options::default())];

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf_descriptors(&opts, path, cfs)
            .map_err(|e| StorageError::Backend(format!("Failed to open DB: {}", e)))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(CF_STATE)
            .ok_or_else(|| StorageError::Backend(format!("missing column family {}", CF_STATE)))
    }
}

impl StorageBackend for RocksDbBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.db
            .get_cf(self.cf()?, key.as_bytes())
            .map_err(|e| StorageError::Backend(format!("Failed to read {}: {}", key, e)))
    }

    fn write_batch(&self, batch: Vec<(String, Vec<u8>)>) -> Result<(), StorageError> {
        let cf = self.cf()?;
        let mut write_batch = WriteBatch::default();
        for (key, value) in batch {
            write_batch.put_cf(cf, key.as_bytes(), value);
        }
        self.db
            .write(write_batch)
            .map_err(|e| StorageError::Backend(format!("Failed to write batch: {}", e)))
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let mut entries = Vec::new();
        for item in self.db.iterator_cf(self.cf()?, IteratorMode::Start) {
            let (key, value) =
                item.map_err(|e| StorageError::Backend(format!("Failed to iterate state: {}", e)))?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| StorageError::Backend(format!("Non UTF-8 key: {}", e)))?;
            entries.push((key, value.to_vec()));
        }
        Ok(entries)
    }
}
