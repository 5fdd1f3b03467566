use crate::context::CliContext;
use crate::error::CliResult;
use clap::Subcommand;
use colored::Colorize;
use icn_committee::ResolutionRequest;

#[derive(Subcommand, Debug, Clone)]
pub enum MemberCommands {
    /// Add the member named by an approved membership resolution
    Add {
        /// Identifier of the approved resolution
        resolution: String,
    },

    /// Remove the member named by an approved membership resolution
    Remove {
        /// Identifier of the approved resolution
        resolution: String,
    },
}

pub fn handle_member_command(context: &CliContext, cmd: &MemberCommands) -> CliResult {
    let config = context.load_config()?;
    let contract = context.open_contract(&config)?;
    let invocation = context.invocation(&config, &contract)?;

    let response = match cmd {
        MemberCommands::Add { resolution } => {
            contract.add_member(&invocation, &ResolutionRequest::new(resolution.clone()))?
        }
        MemberCommands::Remove { resolution } => {
            contract.remove_member(&invocation, &ResolutionRequest::new(resolution.clone()))?
        }
    };

    println!("{} Membership resolution applied", "✓".green());
    println!("Members: {}", response.members.join(", "));
    Ok(())
}
