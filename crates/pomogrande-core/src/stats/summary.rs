use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::history::{HistoryEntry, HistoryLog};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub pomodoros: u64,
    pub completed_todos: u64,
    pub work_minutes: f64,
    pub active_days: u64,
}

impl Totals {
    fn add(&mut self, entry: &HistoryEntry) {
        self.pomodoros += u64::from(entry.total_pomodoros);
        self.completed_todos += u64::from(entry.completed_todos);
        self.work_minutes += entry.total_work_time_minutes;
        self.active_days += 1;
    }
}

/// Headline numbers over the history log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub today: Totals,
    pub last_7_days: Totals,
    pub all_time: Totals,
}

impl HistorySummary {
    pub fn from_log(log: &HistoryLog, today: NaiveDate) -> Self {
        let week_start = today - chrono::Days::new(6);
        let mut summary = Self::default();
        for entry in log.entries() {
            summary.all_time.add(entry);
            if entry.created_at == today {
                summary.today.add(entry);
            }
            if entry.created_at >= week_start && entry.created_at <= today {
                summary.last_7_days.add(entry);
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: NaiveDate, pomodoros: u32) -> HistoryEntry {
        HistoryEntry {
            created_at: day,
            total_pomodoros: pomodoros,
            completed_todos: 1,
            total_work_time_minutes: f64::from(pomodoros) * 25.0,
        }
    }

    #[test]
    fn splits_totals_by_window() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let log = HistoryLog::new(vec![
            entry(today - chrono::Days::new(10), 4),
            entry(today - chrono::Days::new(6), 2),
            entry(today, 3),
        ]);
        let summary = HistorySummary::from_log(&log, today);

        assert_eq!(summary.today.pomodoros, 3);
        assert_eq!(summary.today.active_days, 1);
        assert_eq!(summary.last_7_days.pomodoros, 5);
        assert_eq!(summary.last_7_days.active_days, 2);
        assert_eq!(summary.all_time.pomodoros, 9);
        assert_eq!(summary.all_time.work_minutes, 225.0);
        assert_eq!(summary.all_time.completed_todos, 3);
    }

    #[test]
    fn empty_log_gives_zero_totals() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let summary = HistorySummary::from_log(&HistoryLog::default(), today);
        assert_eq!(summary, HistorySummary::default());
    }
}
