use crate::commands::keygen::KeyFile;
use crate::context::CliContext;
use crate::error::{CliError, CliResult};
use clap::Args;
use colored::Colorize;
use icn_committee::TallyRule;
use icn_config::{CommitteeConfig, StorageKind};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Identifier of the contract, bound into ledger attestations
    #[arg(long)]
    pub contract_id: String,

    /// Tally rule: majority, unanimous or threshold=<percent>
    #[arg(long, default_value = "majority", value_parser = parse_tally_rule)]
    pub tally: TallyRule,

    /// Storage backend: file, memory or rocksdb
    #[arg(long, default_value = "file", value_parser = parse_storage_kind)]
    pub storage: StorageKind,

    /// Storage location, relative to the data directory unless absolute
    #[arg(long)]
    pub storage_path: Option<PathBuf>,
}

pub fn parse_tally_rule(value: &str) -> Result<TallyRule, String> {
    match value {
        "majority" => Ok(TallyRule::Majority),
        "unanimous" => Ok(TallyRule::Unanimous),
        other => {
            let percent = other
                .strip_prefix("threshold=")
                .ok_or_else(|| format!("unknown tally rule '{}'", other))?;
            percent
                .parse::<u8>()
                .map(TallyRule::Threshold)
                .map_err(|e| format!("invalid threshold '{}': {}", percent, e))
        }
    }
}

pub fn parse_storage_kind(value: &str) -> Result<StorageKind, String> {
    match value {
        "file" => Ok(StorageKind::File),
        "memory" => Ok(StorageKind::Memory),
        "rocksdb" => Ok(StorageKind::Rocksdb),
        other => Err(format!("unknown storage backend '{}'", other)),
    }
}

pub fn handle_init(context: &CliContext, args: &InitArgs) -> CliResult {
    let config_path = context.config_path();
    if config_path.exists() {
        return Err(CliError::Config(format!(
            "A committee is already configured at {}",
            config_path.display()
        )));
    }

    let mut config = CommitteeConfig::new(args.contract_id.clone());
    config.tally.rule = args.tally;
    config.storage.backend = args.storage;
    if let Some(path) = &args.storage_path {
        config.storage.path = path.clone();
    }
    config.validate()?;

    let issuer_key_path = config.issuer_key_path(context.data_dir());
    if !issuer_key_path.exists() {
        let (key_file, _) = KeyFile::generate();
        key_file.save(&issuer_key_path, false)?;
        info!(path = %issuer_key_path.display(), "issuer key generated");
    }

    let contract = context.open_contract(&config)?;
    let invocation = context.invocation(&config, &contract)?;
    contract.initialize_contract(&invocation)?;
    config.save(&config_path)?;

    println!(
        "{} Contract {} initialized with owner {}",
        "✓".green(),
        config.contract_id,
        context.caller()
    );
    println!("Config: {}", config_path.display());
    println!("Tally rule: {}", config.tally.rule);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tally_rule() {
        assert_eq!(parse_tally_rule("majority"), Ok(TallyRule::Majority));
        assert_eq!(parse_tally_rule("unanimous"), Ok(TallyRule::Unanimous));
        assert_eq!(parse_tally_rule("threshold=67"), Ok(TallyRule::Threshold(67)));
        assert!(parse_tally_rule("threshold=abc").is_err());
        assert!(parse_tally_rule("plurality").is_err());
    }

    #[test]
    fn test_parse_storage_kind() {
        assert_eq!(parse_storage_kind("file"), Ok(StorageKind::File));
        assert!(parse_storage_kind("sled").is_err());
    }
}
