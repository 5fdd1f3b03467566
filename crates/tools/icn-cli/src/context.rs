use crate::commands::keygen::KeyFile;
use crate::error::{CliError, CliResult};
use icn_committee::storage::StorageBackend;
use icn_committee::{CommitteeContract, CredentialIssuer, FileBackend, InvocationContext, MemoryBackend, StateStore};
use icn_config::{load_committee_config, CommitteeConfig, StorageKind, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Contract over whichever backend the configuration selects
pub type Contract = CommitteeContract<Box<dyn StorageBackend>>;

pub struct CliContext {
    data_dir: PathBuf,
    caller: String,
    pub verbose: bool,
}

impl CliContext {
    pub fn new(data_dir: PathBuf, caller: String, verbose: bool) -> Self {
        Self {
            data_dir,
            caller,
            verbose,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    pub fn load_config(&self) -> CliResult<CommitteeConfig> {
        let path = self.config_path();
        if !path.exists() {
            return Err(CliError::Config(format!(
                "No committee configured in {}. Run `icn-committee init` first.",
                self.data_dir.display()
            )));
        }
        Ok(load_committee_config(&path)?)
    }

    /// Open the contract described by the configuration
    pub fn open_contract(&self, config: &CommitteeConfig) -> CliResult<Contract> {
        let backend = self.open_backend(config)?;
        let policy = config
            .tally
            .rule
            .into_policy()
            .map_err(|e| CliError::Config(e.to_string()))?;
        let issuer_key = KeyFile::load(&config.issuer_key_path(&self.data_dir))?.signing_key()?;

        debug!(policy = %policy.describe(), "contract opened");
        Ok(CommitteeContract::new(
            StateStore::new(backend),
            policy,
            CredentialIssuer::new(issuer_key),
        ))
    }

    fn open_backend(&self, config: &CommitteeConfig) -> CliResult<Box<dyn StorageBackend>> {
        let path = config.storage_path(&self.data_dir);
        match config.storage.backend {
            StorageKind::File => {
                let backend = FileBackend::open(&path).map_err(icn_committee::CommitteeError::from)?;
                Ok(Box::new(backend))
            }
            StorageKind::Memory => {
                warn!("memory storage does not persist between invocations");
                Ok(Box::new(MemoryBackend::new()))
            }
            #[cfg(feature = "persistence")]
            StorageKind::Rocksdb => {
                let backend = icn_committee::storage::RocksDbBackend::new(&path)
                    .map_err(icn_committee::CommitteeError::from)?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "persistence"))]
            StorageKind::Rocksdb => Err(CliError::Config(
                "rocksdb storage requires icn-cli to be built with the `persistence` feature".to_string(),
            )),
        }
    }

    /// Invocation context for the configured contract; carries the current state hash
    pub fn invocation(&self, config: &CommitteeConfig, contract: &Contract) -> CliResult<InvocationContext> {
        let state_hash = contract.state_hash()?;
        Ok(InvocationContext::new(self.caller.clone(), config.contract_id.clone()).with_state_hash(state_hash))
    }
}
