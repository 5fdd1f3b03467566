use crate::commands::committee::CommitteeCommands;
use crate::commands::init::InitArgs;
use crate::commands::keygen::KeygenArgs;
use crate::commands::ledger::LedgerCommands;
use crate::commands::member::MemberCommands;
use crate::commands::resolution::ResolutionCommands;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "icn-committee", author, version, about = "Operate an ICN committee contract", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global_opts: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Parser, Debug)]
pub struct GlobalOpts {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data directory (defaults to $ICN_COMMITTEE_DATA_DIR or ~/.icn-committee)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Identity the operation is performed as
    #[arg(long = "as", value_name = "IDENTITY", default_value = "anonymous", global = true)]
    pub caller: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate an Ed25519 key file
    Keygen(KeygenArgs),

    /// Create the contract configuration and record the caller as owner
    Init(InitArgs),

    /// Committee setup and inspection
    #[command(subcommand)]
    Committee(CommitteeCommands),

    /// Apply approved membership resolutions
    #[command(subcommand)]
    Member(MemberCommands),

    /// Propose, vote on, inspect and issue resolutions
    #[command(subcommand)]
    Resolution(ResolutionCommands),

    /// Stand-in for the external ledger
    #[command(subcommand)]
    Ledger(LedgerCommands),
}
