use crate::commands::keygen::KeyFile;
use crate::context::CliContext;
use crate::error::CliResult;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use clap::Subcommand;
use ed25519_dalek::Signer;
use icn_committee::commitment_payload;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum LedgerCommands {
    /// Sign the contract id and current state hash with a ledger key
    Attest {
        /// Ledger key file
        #[arg(long)]
        key: PathBuf,
    },
}

pub fn handle_ledger_command(context: &CliContext, cmd: &LedgerCommands) -> CliResult {
    match cmd {
        LedgerCommands::Attest { key } => {
            let config = context.load_config()?;
            let contract = context.open_contract(&config)?;
            let ledger_key = KeyFile::load(key)?.signing_key()?;

            let state_hash = contract.state_hash()?;
            let signature = ledger_key.sign(&commitment_payload(&config.contract_id, &state_hash));

            println!("State hash: {}", hex::encode(state_hash));
            println!("{}", BASE64_STANDARD.encode(signature.to_bytes()));
        }
    }
    Ok(())
}
