//! Property tests for the history log.
//!
//! Whatever order sessions arrive in, the log keeps one entry per day, never
//! grows past its capacity, and loses nothing for the days it keeps.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pomogrande_core::stats::{HistoryEntry, HistoryLog, SessionTotals, HISTORY_CAPACITY};
use proptest::prelude::*;

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Days::new(u64::from(offset))
}

fn entry(offset: u32, pomodoros: u32) -> HistoryEntry {
    SessionTotals {
        pomodoros,
        completed_todos: pomodoros % 3,
        work_ms: 25 * 60_000,
        remaining_ms: 0,
        ultra_focus: false,
    }
    .into_entry(day(offset))
}

proptest! {
    #[test]
    fn log_is_capped_and_unique_by_day(
        sessions in prop::collection::vec((0u32..150, 1u32..5), 0..400)
    ) {
        let mut log = HistoryLog::default();
        for (offset, pomodoros) in &sessions {
            log.merge(entry(*offset, *pomodoros));
        }

        prop_assert!(log.len() <= HISTORY_CAPACITY);
        let mut days: Vec<_> = log.entries().iter().map(|e| e.created_at).collect();
        let total = days.len();
        days.sort();
        days.dedup();
        prop_assert_eq!(days.len(), total);
    }

    #[test]
    fn same_day_sessions_sum_exactly(
        sessions in prop::collection::vec((0u32..30, 1u32..5), 1..200)
    ) {
        let mut expected: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        let mut log = HistoryLog::default();
        for (offset, pomodoros) in &sessions {
            *expected.entry(day(*offset)).or_default() += pomodoros;
            log.merge(entry(*offset, *pomodoros));
        }

        prop_assert_eq!(log.len(), expected.len());
        for (date, pomodoros) in expected {
            let kept = log.day(date).unwrap();
            prop_assert_eq!(kept.total_pomodoros, pomodoros);
            prop_assert_eq!(kept.total_work_time_minutes, f64::from(pomodoros) * 25.0);
        }
    }
}

#[test]
fn hundred_and_first_day_drops_the_oldest() {
    let mut log = HistoryLog::default();
    for offset in 0..=HISTORY_CAPACITY as u32 {
        log.merge(entry(offset, 1));
    }
    assert_eq!(log.len(), HISTORY_CAPACITY);
    assert!(log.day(day(0)).is_none());
    assert!(log.day(day(HISTORY_CAPACITY as u32)).is_some());
}
