pub mod committee;
pub mod init;
pub mod keygen;
pub mod ledger;
pub mod member;
pub mod resolution;

pub use committee::handle_committee_command;
pub use init::handle_init;
pub use keygen::handle_keygen;
pub use ledger::handle_ledger_command;
pub use member::handle_member_command;
pub use resolution::handle_resolution_command;

use crate::error::CliResult;
use serde::Serialize;

/// Pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
