use crate::commands::keygen::KeyFile;
use crate::context::CliContext;
use crate::error::{CliError, CliResult};
use clap::Subcommand;
use colored::Colorize;
use icn_committee::InitializeCommitteeRequest;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum CommitteeCommands {
    /// Register the ledger key and founding members (owner only)
    Init {
        /// Base64 Ed25519 verifying key of the ledger
        #[arg(long, required_unless_present = "ledger_key_file", conflicts_with = "ledger_key_file")]
        ledger_key: Option<String>,

        /// Key file whose public key is the ledger key
        #[arg(long)]
        ledger_key_file: Option<PathBuf>,

        /// Founding member identities, comma separated or repeated
        #[arg(long = "member", value_delimiter = ',', required = true)]
        members: Vec<String>,
    },

    /// List committee members
    Members,
}

pub fn handle_committee_command(context: &CliContext, cmd: &CommitteeCommands) -> CliResult {
    let config = context.load_config()?;
    let contract = context.open_contract(&config)?;
    let invocation = context.invocation(&config, &contract)?;

    match cmd {
        CommitteeCommands::Init {
            ledger_key,
            ledger_key_file,
            members,
        } => {
            let ledger_verifying_key = match (ledger_key, ledger_key_file) {
                (Some(key), _) => key.clone(),
                (None, Some(path)) => KeyFile::load(path)?.public_key,
                (None, None) => return Err(CliError::Input("a ledger key is required".to_string())),
            };
            let request = InitializeCommitteeRequest {
                ledger_verifying_key,
                initial_members: members.clone(),
            };
            contract.initialize_committee(&invocation, &request)?;
            println!(
                "{} Committee initialized with {} member(s); ownership relinquished",
                "✓".green(),
                members.len()
            );
        }
        CommitteeCommands::Members => {
            for member in contract.members(&invocation)? {
                println!("{}", member);
            }
        }
    }
    Ok(())
}
