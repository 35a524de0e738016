//! In-process store.
//!
//! Several handles may share one store; each handle is its own writer, so a
//! settings surface holding `store.surface()` produces changes the controller's
//! handle observes through `poll_changes`.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{StorageChange, StorageKey, Store};
use crate::error::StorageError;

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<StorageKey, Value>,
    /// Append-only write log: (writer, change).
    log: Vec<(u32, StorageChange)>,
    cursors: HashMap<u32, usize>,
    next_writer: u32,
    /// When set, every write fails. Used to exercise failure paths.
    fail_writes: bool,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    writer: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_writer: 1,
                ..Inner::default()
            })),
            writer: 0,
        }
    }

    /// A new handle onto the same data that writes as a separate surface.
    pub fn surface(&self) -> Self {
        let mut inner = self.lock();
        let writer = inner.next_writer;
        inner.next_writer += 1;
        let cursor = inner.log.len();
        inner.cursors.insert(writer, cursor);
        Self {
            inner: Arc::clone(&self.inner),
            writer,
        }
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, inner: &mut Inner, change: StorageChange) {
        inner.log.push((self.writer, change));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: StorageKey) -> Result<Option<Value>, StorageError> {
        Ok(self.lock().values.get(&key).cloned())
    }

    fn set_many(&self, entries: &[(StorageKey, Value)]) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageError::QueryFailed("writes disabled".into()));
        }
        for (key, value) in entries {
            inner.values.insert(*key, value.clone());
            self.record(
                &mut inner,
                StorageChange {
                    key: *key,
                    value: Some(value.clone()),
                },
            );
        }
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageError::QueryFailed("writes disabled".into()));
        }
        inner.values.remove(&key);
        self.record(&mut inner, StorageChange { key, value: None });
        Ok(())
    }

    fn poll_changes(&self) -> Result<Vec<StorageChange>, StorageError> {
        let mut inner = self.lock();
        let start = inner.cursors.get(&self.writer).copied().unwrap_or(0);
        let changes = inner.log[start..]
            .iter()
            .filter(|(writer, _)| *writer != self.writer)
            .map(|(_, change)| change.clone())
            .collect();
        let end = inner.log.len();
        inner.cursors.insert(self.writer, end);
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_writes_are_not_reported_back() {
        let store = MemoryStore::new();
        store.set(StorageKey::Time, Value::from(10u64)).unwrap();
        assert!(store.poll_changes().unwrap().is_empty());
    }

    #[test]
    fn surface_writes_are_observed_once() {
        let store = MemoryStore::new();
        let settings = store.surface();
        settings.set(StorageKey::WorkTime, Value::from(5u64)).unwrap();

        let changes = store.poll_changes().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, StorageKey::WorkTime);
        assert!(store.poll_changes().unwrap().is_empty());
    }

    #[test]
    fn removals_are_reported_as_none() {
        let store = MemoryStore::new();
        let settings = store.surface();
        settings.set(StorageKey::Todos, Value::Array(vec![])).unwrap();
        settings.remove(StorageKey::Todos).unwrap();
        let changes = store.poll_changes().unwrap();
        assert_eq!(changes.last().unwrap().value, None);
        assert_eq!(store.get(StorageKey::Todos).unwrap(), None);
    }

    #[test]
    fn failing_writes_leave_values_untouched() {
        let store = MemoryStore::new();
        store.set(StorageKey::Time, Value::from(1u64)).unwrap();
        store.set_fail_writes(true);
        assert!(store.set(StorageKey::Time, Value::from(2u64)).is_err());
        assert_eq!(store.get(StorageKey::Time).unwrap(), Some(Value::from(1u64)));
    }
}
