mod config;
pub mod database;
mod keys;
mod memory;

pub use config::{BadgeConfig, Config, DefaultsConfig, LogConfig, TimerConfig};
pub use database::{CommandQueue, Database};
pub use keys::{FieldKind, StorageKey};
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;

use crate::error::StorageError;

/// A field written by someone other than the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: StorageKey,
    /// `None` when the field was removed.
    pub value: Option<Value>,
}

/// Persistence gateway shared between the controller and other surfaces.
///
/// Writes issued through a gateway handle are never reported back to that
/// handle by `poll_changes`; only writes from other handles are.
pub trait Store: Send {
    fn get(&self, key: StorageKey) -> Result<Option<Value>, StorageError>;

    fn set_many(&self, entries: &[(StorageKey, Value)]) -> Result<(), StorageError>;

    fn set(&self, key: StorageKey, value: Value) -> Result<(), StorageError> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError>;

    /// Drain field changes made by other writers since the last call.
    fn poll_changes(&self) -> Result<Vec<StorageChange>, StorageError>;
}

/// Read and decode a field, treating a missing key as `None`.
pub fn read_field<T: DeserializeOwned>(
    store: &dyn Store,
    key: StorageKey,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::Malformed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Returns the data directory.
///
/// `POMOGRANDE_DATA_DIR` wins when set; otherwise `~/.config/pomogrande[-dev]/`
/// depending on `POMOGRANDE_ENV`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("POMOGRANDE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("POMOGRANDE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomogrande-dev")
            } else {
                base_dir.join("pomogrande")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_field_decodes_typed_values() {
        let store = MemoryStore::new();
        store.set(StorageKey::WorkTime, Value::from(60_000u64)).unwrap();
        let work: Option<u64> = read_field(&store, StorageKey::WorkTime).unwrap();
        assert_eq!(work, Some(60_000));
        let missing: Option<u64> = read_field(&store, StorageKey::BreakTime).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn read_field_reports_malformed_values() {
        let store = MemoryStore::new();
        store.set(StorageKey::WorkTime, Value::from("soon")).unwrap();
        let result: Result<Option<u64>, _> = read_field(&store, StorageKey::WorkTime);
        assert!(matches!(result, Err(StorageError::Malformed { .. })));
    }
}
