use chrono::Local;
use clap::Subcommand;
use pomogrande_core::{HistoryAggregator, HistorySummary};

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Show today's totals
    Today,
    /// Show today, last 7 days, and all-time totals
    All,
    /// Print raw history entries, oldest first
    History {
        /// Only the most recent N days
        #[arg(long)]
        days: Option<usize>,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let db = open_store()?;
    let log = HistoryAggregator::load(&db)?;
    let today = Local::now().date_naive();

    match action {
        StatsAction::Today => print_json(&HistorySummary::from_log(&log, today).today),
        StatsAction::All => print_json(&HistorySummary::from_log(&log, today)),
        StatsAction::History { days } => {
            let entries = log.entries();
            let skip = days.map_or(0, |n| entries.len().saturating_sub(n));
            print_json(&entries[skip..])
        }
    }
}
