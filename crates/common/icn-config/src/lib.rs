use anyhow::Context;
use icn_committee::TallyRule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE_NAME: &str = "committee.toml";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "ICN_COMMITTEE_DATA_DIR";

/// Configuration of one committee deployment.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommitteeConfig {
    /// Identifier of the contract; bound into ledger attestations and issued credentials
    pub contract_id: String,

    /// Key the contract signs issued credentials with. Relative paths resolve against the data dir.
    #[serde(default = "default_issuer_key_path")]
    pub issuer_key_path: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub tally: TallyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    #[default]
    File,
    /// Requires the `persistence` feature
    Rocksdb,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageKind,
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            path: default_storage_path(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    #[serde(default)]
    pub rule: TallyRule,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default tracing filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_issuer_key_path() -> PathBuf {
    PathBuf::from("issuer_key.json")
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("committee_state.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CommitteeConfig {
    pub fn new(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            issuer_key_path: default_issuer_key_path(),
            storage: StorageConfig::default(),
            tally: TallyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.contract_id.trim().is_empty() {
            anyhow::bail!("contract_id must not be empty");
        }
        self.tally
            .rule
            .into_policy()
            .map_err(|e| anyhow::anyhow!("invalid [tally] rule: {}", e))?;
        Ok(())
    }

    /// Storage path, resolved against `data_dir` when relative
    pub fn storage_path(&self, data_dir: &Path) -> PathBuf {
        resolve_path(data_dir, &self.storage.path)
    }

    pub fn issuer_key_path(&self, data_dir: &Path) -> PathBuf {
        resolve_path(data_dir, &self.issuer_key_path)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize committee config")
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        std::fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("Failed to write config file to {}", path.display()))
    }
}

fn resolve_path(data_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

pub fn load_committee_config(path: &Path) -> anyhow::Result<CommitteeConfig> {
    let config_content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file from {}: {}", path.display(), e))?;
    let config: CommitteeConfig = toml::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse TOML config from {}: {}", path.display(), e))?;
    config.validate()?;
    Ok(config)
}

/// Data directory: the explicit path, else `$ICN_COMMITTEE_DATA_DIR`, else `~/.icn-committee`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    data_dir_from(explicit, std::env::var(DATA_DIR_ENV).ok(), dirs::home_dir())
}

fn data_dir_from(
    explicit: Option<&Path>,
    env_dir: Option<String>,
    home: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    home.map(|h| h.join(".icn-committee"))
        .ok_or_else(|| anyhow::anyhow!("Failed to find home directory"))
}
