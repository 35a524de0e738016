//! Per-day productivity log.
//!
//! Each stopped session becomes a [`HistoryEntry`] that is merged into the
//! entry for the same calendar day, so the log holds at most one entry per
//! day and never more than [`HISTORY_CAPACITY`] days.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StorageError;
use crate::storage::{read_field, StorageKey, Store};

/// Most recent days kept in the log.
pub const HISTORY_CAPACITY: usize = 100;

const ONE_MINUTE_MS: f64 = 60_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(deserialize_with = "deserialize_day")]
    pub created_at: NaiveDate,
    pub total_pomodoros: u32,
    pub completed_todos: u32,
    #[serde(rename = "totalWorkTime")]
    pub total_work_time_minutes: f64,
}

impl HistoryEntry {
    fn absorb(&mut self, other: &HistoryEntry) {
        self.total_pomodoros += other.total_pomodoros;
        self.completed_todos += other.completed_todos;
        self.total_work_time_minutes += other.total_work_time_minutes;
    }
}

/// Accepts `YYYY-MM-DD` as well as full RFC 3339 timestamps written by older
/// versions; only the date part is kept.
fn deserialize_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(day) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.date_naive())
        .map_err(serde::de::Error::custom)
}

/// What a session contributed when it was stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionTotals {
    pub pomodoros: u32,
    pub completed_todos: u32,
    /// Configured work duration at stop time.
    pub work_ms: u64,
    pub remaining_ms: u64,
    pub ultra_focus: bool,
}

impl SessionTotals {
    /// Ultra focus sessions count the time actually spent; regular sessions
    /// count whole Pomodoros.
    pub fn work_minutes(&self) -> f64 {
        let total_ms = if self.ultra_focus {
            self.work_ms.saturating_sub(self.remaining_ms)
        } else {
            u64::from(self.pomodoros).saturating_mul(self.work_ms)
        };
        total_ms as f64 / ONE_MINUTE_MS
    }

    pub fn into_entry(self, day: NaiveDate) -> HistoryEntry {
        HistoryEntry {
            created_at: day,
            total_pomodoros: self.pomodoros,
            completed_todos: self.completed_todos,
            total_work_time_minutes: self.work_minutes(),
        }
    }
}

/// Ordered history, unique by day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn day(&self, day: NaiveDate) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.created_at == day)
    }

    /// Fold `entry` into the log: same-day entries are summed, the list keeps
    /// first-seen day order, and only the newest [`HISTORY_CAPACITY`] days
    /// survive.
    pub fn merge(&mut self, entry: HistoryEntry) {
        let mut merged: Vec<HistoryEntry> = Vec::with_capacity(self.entries.len() + 1);
        for current in self.entries.drain(..).chain(std::iter::once(entry)) {
            match merged.iter_mut().find(|e| e.created_at == current.created_at) {
                Some(existing) => existing.absorb(&current),
                None => merged.push(current),
            }
        }

        let overflow = merged.len().saturating_sub(HISTORY_CAPACITY);
        merged.drain(..overflow);
        self.entries = merged;
    }
}

/// Merges stopped sessions into the persisted log.
pub struct HistoryAggregator;

impl HistoryAggregator {
    pub fn load(store: &dyn Store) -> Result<HistoryLog, StorageError> {
        Ok(read_field(store, StorageKey::PomodoroHistory)?.unwrap_or_default())
    }

    /// Record a stopped session under `day` and persist the merged log.
    ///
    /// A log that cannot be read is left untouched and the error returned.
    pub fn commit(
        store: &dyn Store,
        totals: SessionTotals,
        day: NaiveDate,
    ) -> Result<HistoryEntry, StorageError> {
        let entry = totals.into_entry(day);
        let mut log = Self::load(store)?;
        log.merge(entry.clone());

        let value = serde_json::to_value(&log).map_err(|e| StorageError::Malformed {
            key: StorageKey::PomodoroHistory.to_string(),
            message: e.to_string(),
        })?;
        store.set(StorageKey::PomodoroHistory, value)?;
        tracing::info!(
            day = %day,
            pomodoros = entry.total_pomodoros,
            minutes = entry.total_work_time_minutes,
            days = log.len(),
            "session recorded in history"
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Days::new(u64::from(d))
    }

    fn entry(d: u32, pomodoros: u32) -> HistoryEntry {
        HistoryEntry {
            created_at: day(d),
            total_pomodoros: pomodoros,
            completed_todos: 0,
            total_work_time_minutes: f64::from(pomodoros) * 25.0,
        }
    }

    #[test]
    fn regular_minutes_count_whole_pomodoros() {
        let totals = SessionTotals {
            pomodoros: 2,
            completed_todos: 0,
            work_ms: 25 * 60_000,
            remaining_ms: 60_000,
            ultra_focus: false,
        };
        assert_eq!(totals.work_minutes(), 50.0);
    }

    #[test]
    fn ultra_focus_minutes_count_elapsed_time() {
        let totals = SessionTotals {
            pomodoros: 0,
            completed_todos: 0,
            work_ms: 60 * 60_000,
            remaining_ms: 45 * 60_000,
            ultra_focus: true,
        };
        assert_eq!(totals.work_minutes(), 15.0);
    }

    #[test]
    fn same_day_entries_are_summed() {
        let mut log = HistoryLog::default();
        log.merge(entry(0, 1));
        log.merge(entry(0, 3));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].total_pomodoros, 4);
        assert_eq!(log.entries()[0].total_work_time_minutes, 100.0);
    }

    #[test]
    fn merge_collapses_duplicate_days_already_in_the_log() {
        let mut log = HistoryLog::new(vec![entry(0, 1), entry(1, 1), entry(0, 2)]);
        log.merge(entry(2, 1));
        let days: Vec<_> = log.entries().iter().map(|e| e.created_at).collect();
        assert_eq!(days, vec![day(0), day(1), day(2)]);
        assert_eq!(log.day(day(0)).unwrap().total_pomodoros, 3);
    }

    #[test]
    fn oldest_day_is_dropped_past_capacity() {
        let mut log = HistoryLog::default();
        for d in 0..HISTORY_CAPACITY as u32 {
            log.merge(entry(d, 1));
        }
        assert_eq!(log.len(), HISTORY_CAPACITY);
        log.merge(entry(HISTORY_CAPACITY as u32, 1));
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.entries()[0].created_at, day(1));
        assert_eq!(log.entries().last().unwrap().created_at, day(100));
    }

    #[test]
    fn legacy_timestamps_are_read_as_days() {
        let json = r#"[{"createdAt":"2026-03-04T18:30:00.000Z","totalPomodoros":2,"completedTodos":1,"totalWorkTime":50}]"#;
        let log: HistoryLog = serde_json::from_str(json).unwrap();
        assert_eq!(
            log.entries()[0].created_at,
            NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
        );
    }

    #[test]
    fn entry_json_matches_stored_shape() {
        let json = serde_json::to_value(entry(0, 1)).unwrap();
        assert_eq!(json["createdAt"], "2026-01-01");
        assert_eq!(json["totalPomodoros"], 1);
        assert_eq!(json["totalWorkTime"], 25.0);
    }

    #[test]
    fn commit_persists_the_merged_log() {
        let store = MemoryStore::new();
        let totals = SessionTotals {
            pomodoros: 1,
            completed_todos: 2,
            work_ms: 25 * 60_000,
            remaining_ms: 25 * 60_000,
            ultra_focus: false,
        };
        HistoryAggregator::commit(&store, totals, day(5)).unwrap();
        HistoryAggregator::commit(&store, totals, day(5)).unwrap();

        let log = HistoryAggregator::load(&store).unwrap();
        assert_eq!(log.len(), 1);
        let today = log.day(day(5)).unwrap();
        assert_eq!(today.total_pomodoros, 2);
        assert_eq!(today.completed_todos, 4);
        assert_eq!(today.total_work_time_minutes, 50.0);
    }

    #[test]
    fn unreadable_log_is_not_overwritten() {
        let store = MemoryStore::new();
        store
            .set(StorageKey::PomodoroHistory, serde_json::json!({"oops": true}))
            .unwrap();
        let totals = SessionTotals {
            pomodoros: 1,
            completed_todos: 0,
            work_ms: 60_000,
            remaining_ms: 0,
            ultra_focus: false,
        };
        assert!(HistoryAggregator::commit(&store, totals, day(0)).is_err());
        assert_eq!(
            store.get(StorageKey::PomodoroHistory).unwrap(),
            Some(serde_json::json!({"oops": true}))
        );
    }
}
