use crate::commands::print_json;
use crate::context::CliContext;
use crate::error::{CliError, CliResult};
use clap::Subcommand;
use colored::Colorize;
use icn_committee::{IssueCredentialRequest, ProposeResolutionRequest, ResolutionRequest, ResolutionStatus};
use std::fs;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum ResolutionCommands {
    /// Propose a credential for committee approval
    Propose {
        /// Credential JSON: {"subject": "...", "claims": {...}}
        #[arg(long, required_unless_present = "credential_file", conflicts_with = "credential_file")]
        credential: Option<String>,

        /// File containing the credential JSON
        #[arg(long)]
        credential_file: Option<PathBuf>,
    },

    /// Vote in favour of a resolution
    Approve {
        resolution: String,
    },

    /// Vote against a resolution
    Disapprove {
        resolution: String,
    },

    /// List every resolution identifier
    List,

    /// Show a resolution's status, votes and credential
    Status {
        resolution: String,
    },

    /// Issue the credential of an approved, ledger-attested resolution
    Issue {
        resolution: String,

        /// Base64 ledger signature over the contract id and state hash
        #[arg(long)]
        ledger_signature: String,

        /// Write the credential to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn status_label(status: ResolutionStatus) -> colored::ColoredString {
    match status {
        ResolutionStatus::Pending => status.to_string().yellow(),
        ResolutionStatus::Approved => status.to_string().green(),
        ResolutionStatus::Rejected => status.to_string().red(),
        ResolutionStatus::Expired => status.to_string().dimmed(),
    }
}

fn read_credential(inline: &Option<String>, file: &Option<PathBuf>) -> CliResult<serde_json::Value> {
    let raw = match (inline, file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Err(CliError::Input("a credential is required".to_string())),
    };
    serde_json::from_str(&raw).map_err(|e| CliError::Input(format!("credential is not valid JSON: {}", e)))
}

pub fn handle_resolution_command(context: &CliContext, cmd: &ResolutionCommands) -> CliResult {
    let config = context.load_config()?;
    let contract = context.open_contract(&config)?;
    let invocation = context.invocation(&config, &contract)?;

    match cmd {
        ResolutionCommands::Propose {
            credential,
            credential_file,
        } => {
            let request = ProposeResolutionRequest {
                credential: read_credential(credential, credential_file)?,
            };
            let response = contract.propose_resolution(&invocation, &request)?;
            println!("{} Resolution proposed", "✓".green());
            println!("{}", response.resolution_identifier);
        }
        ResolutionCommands::Approve { resolution } => {
            let response = contract.approve_resolution(&invocation, &ResolutionRequest::new(resolution.clone()))?;
            println!("{} Approval recorded for {}", "✓".green(), context.caller());
            println!("Status: {}", status_label(response.status));
        }
        ResolutionCommands::Disapprove { resolution } => {
            let response =
                contract.disapprove_resolution(&invocation, &ResolutionRequest::new(resolution.clone()))?;
            println!("{} Disapproval recorded for {}", "✓".green(), context.caller());
            println!("Status: {}", status_label(response.status));
        }
        ResolutionCommands::List => {
            for id in contract.list_resolutions(&invocation)?.resolution_identifiers {
                println!("{}", id);
            }
        }
        ResolutionCommands::Status { resolution } => {
            let response = contract.resolution_status(&invocation, &ResolutionRequest::new(resolution.clone()))?;
            print_json(&response)?;
        }
        ResolutionCommands::Issue {
            resolution,
            ledger_signature,
            output,
        } => {
            let request = IssueCredentialRequest {
                ledger_signature: ledger_signature.clone(),
                resolution_identifier: resolution.clone(),
            };
            let credential = contract.issue_resolution_credential(&invocation, &request)?;
            let json = credential
                .to_json()
                .map_err(|e| CliError::Input(format!("failed to render credential: {}", e)))?;
            match output {
                Some(path) => {
                    fs::write(path, json)?;
                    println!("{} Credential written to {}", "✓".green(), path.display());
                }
                None => println!("{}", json),
            }
        }
    }
    Ok(())
}
