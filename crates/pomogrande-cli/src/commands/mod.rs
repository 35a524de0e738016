pub mod config;
pub mod daemon;
pub mod settings;
pub mod sites;
pub mod stats;
pub mod timer;
pub mod todo;

use pomogrande_core::storage::Database;
use pomogrande_core::StorageError;
use serde::Serialize;

/// Origin name for writes made from the command line.
const CLI_ORIGIN: &str = "cli";

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn open_store() -> Result<Database, StorageError> {
    Database::open(CLI_ORIGIN)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
