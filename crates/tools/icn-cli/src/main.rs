use clap::Parser;
use colored::Colorize;
use icn_cli::{init_tracing, run, Cli};
use icn_config::{load_committee_config, resolve_data_dir, CONFIG_FILE_NAME};

fn main() {
    let cli = Cli::parse();

    // Logging level from the config file, when one exists
    let configured_level = resolve_data_dir(cli.global_opts.data_dir.as_deref())
        .ok()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
        .and_then(|path| load_committee_config(&path).ok())
        .map(|config| config.logging.level);
    init_tracing(cli.global_opts.verbose, configured_level.as_deref());

    if let Err(e) = run(cli) {
        eprintln!("{} [{}] {}", "error:".red(), e.label(), e);
        std::process::exit(e.exit_code());
    }
}
