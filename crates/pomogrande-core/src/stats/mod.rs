//! Statistics module for Pomogrande
//!
//! Holds the per-day history log that stopped sessions are merged into, and
//! the summaries built on top of it.

mod history;
mod summary;

pub use history::{HistoryAggregator, HistoryEntry, HistoryLog, SessionTotals, HISTORY_CAPACITY};
pub use summary::{HistorySummary, Totals};
