use clap::Subcommand;
use pomogrande_core::storage::{StorageKey, Store};
use serde_json::{Map, Value};

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print a stored field as JSON
    Get {
        /// Field name (e.g. "workTime", "isSoundEnabled")
        key: String,
    },
    /// Change a setting
    Set {
        /// Field name
        key: String,
        /// New value; durations in milliseconds, volumes in [0, 1]
        value: String,
    },
    /// List every setting
    List,
}

pub fn run(action: SettingsAction) -> CliResult {
    let db = open_store()?;
    match action {
        SettingsAction::Get { key } => {
            let key: StorageKey = key.parse()?;
            print_json(&db.get(key)?.unwrap_or(Value::Null))
        }
        SettingsAction::Set { key, value } => {
            let key: StorageKey = key.parse()?;
            if !key.is_setting() {
                return Err(format!("'{key}' cannot be set from the settings surface").into());
            }
            db.set(key, key.parse_value(&value)?)?;
            println!("ok");
            Ok(())
        }
        SettingsAction::List => {
            let mut settings = Map::new();
            for key in StorageKey::ALL.into_iter().filter(StorageKey::is_setting) {
                settings.insert(key.to_string(), db.get(key)?.unwrap_or(Value::Null));
            }
            print_json(&settings)
        }
    }
}
