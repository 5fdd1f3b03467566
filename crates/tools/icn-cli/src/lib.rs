//! `icn-committee`: drives a committee contract stored in a local data directory.

pub mod cli;
pub mod commands;
pub mod context;
pub mod error;

pub use cli::{Cli, Commands, GlobalOpts};
pub use context::CliContext;
pub use error::{CliError, CliResult};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber on stderr. `RUST_LOG` wins over `-v`, which wins over the configured level.
pub fn init_tracing(verbose: u8, configured_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => configured_level.unwrap_or("warn"),
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::new(level)
    });

    // A subscriber may already be installed when the CLI runs inside tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main library entry point.
pub fn run(cli: Cli) -> CliResult<()> {
    let data_dir = icn_config::resolve_data_dir(cli.global_opts.data_dir.as_deref())?;
    let ctx = CliContext::new(data_dir, cli.global_opts.caller.clone(), cli.global_opts.verbose > 0);

    match &cli.command {
        Commands::Keygen(args) => commands::handle_keygen(args)?,
        Commands::Init(args) => commands::handle_init(&ctx, args)?,
        Commands::Committee(cmd) => commands::handle_committee_command(&ctx, cmd)?,
        Commands::Member(cmd) => commands::handle_member_command(&ctx, cmd)?,
        Commands::Resolution(cmd) => commands::handle_resolution_command(&ctx, cmd)?,
        Commands::Ledger(cmd) => commands::handle_ledger_command(&ctx, cmd)?,
    }

    Ok(())
}
