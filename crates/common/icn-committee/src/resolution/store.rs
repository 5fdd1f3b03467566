use super::Resolution;
use crate::error::{CommitteeError, CommitteeResult};
use crate::storage::KeyValueStore;
use tracing::{debug, info};

/// Key of the master index of resolution identifiers
pub const RESOLUTION_INDEX_KEY: &str = "__RESOLUTION_LIST__";

/// Persists resolutions by id plus an append-only index of every id accepted.
pub struct ResolutionStore<S> {
    store: S,
}

impl<S: KeyValueStore> ResolutionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Write the empty index. Must run once before any other operation.
    pub fn initialize(&self) -> CommitteeResult<()> {
        if self.store.get(RESOLUTION_INDEX_KEY)?.is_some() {
            return Err(CommitteeError::State(
                "resolution store is already initialized".to_string(),
            ));
        }
        self.store.set_json(RESOLUTION_INDEX_KEY, &Vec::<String>::new())?;
        debug!("resolution index initialized");
        Ok(())
    }

    fn index(&self) -> CommitteeResult<Vec<String>> {
        self.store
            .get_json(RESOLUTION_INDEX_KEY)?
            .ok_or(CommitteeError::NotInitialized)
    }

    /// Store a new resolution and append its id to the index.
    ///
    /// The duplicate scan and both writes happen inside the caller's transaction,
    /// so two identical proposals can never both pass the scan.
    pub fn add_resolution(&self, resolution: &Resolution) -> CommitteeResult<()> {
        let mut index = self.index()?;
        if index.iter().any(|id| id == resolution.id()) {
            return Err(CommitteeError::Conflict(format!(
                "resolution {} already exists",
                resolution.id()
            )));
        }

        self.store.set_json(resolution.id(), resolution)?;
        index.push(resolution.id().to_string());
        self.store.set_json(RESOLUTION_INDEX_KEY, &index)?;

        info!(resolution_id = %resolution.id(), "resolution stored");
        Ok(())
    }

    /// Overwrite a stored resolution. The index is left untouched.
    pub fn update_resolution(&self, resolution: &Resolution) -> CommitteeResult<()> {
        self.store.set_json(resolution.id(), resolution)?;
        debug!(resolution_id = %resolution.id(), status = %resolution.status(), "resolution updated");
        Ok(())
    }

    pub fn get_resolution(&self, id: &str) -> CommitteeResult<Resolution> {
        let not_found = || CommitteeError::NotFound(format!("resolution {}", id));

        // The index key shares the namespace; it is never a resolution.
        if id == RESOLUTION_INDEX_KEY {
            return Err(not_found());
        }
        let bytes = self.store.get(id)?.ok_or_else(not_found)?;
        let resolution: Resolution = serde_json::from_slice(&bytes).map_err(|e| {
            debug!(resolution_id = %id, error = %e, "stored resolution failed to parse");
            not_found()
        })?;
        if resolution.id() != id || resolution.validate().is_err() {
            debug!(resolution_id = %id, "stored resolution failed validation");
            return Err(not_found());
        }
        Ok(resolution)
    }

    /// Every id ever added, in insertion order, regardless of status
    pub fn list_resolutions(&self) -> CommitteeResult<Vec<String>> {
        self.index()
    }
}
