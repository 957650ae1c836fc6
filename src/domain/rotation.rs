//! Portfolio rotation with hysteresis.
//!
//! Holdings are kept while they stay anywhere on the period's leaderboard;
//! only freed slots are refilled, walking the leaderboard in rank order.

use crate::domain::ranking::RankedPeriod;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_SLOTS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingChanges {
    pub added: Vec<String>,
    pub dropped: Vec<String>,
}

impl HoldingChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.dropped.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(rename = "portfolio")]
    pub holdings: Vec<String>,
    pub changes: HoldingChanges,
}

impl PortfolioState {
    pub fn holds(&self, ticker: &str) -> bool {
        self.holdings.iter().any(|t| t == ticker)
    }
}

/// Opening state: the first `slots` tickers of the first leaderboard.
pub fn initial_state(period: &RankedPeriod, slots: usize) -> PortfolioState {
    let holdings: Vec<String> = period.tickers().take(slots).map(str::to_string).collect();
    PortfolioState {
        period_start: period.period_start,
        period_end: period.period_end,
        changes: HoldingChanges {
            added: holdings.clone(),
            dropped: Vec::new(),
        },
        holdings,
    }
}

/// Advance `previous` holdings by one period.
///
/// Incumbents still on the leaderboard keep their slot and their order;
/// newcomers are appended in rank order until `slots` are filled or the
/// leaderboard runs out.
pub fn next_state(previous: &[String], period: &RankedPeriod, slots: usize) -> PortfolioState {
    let (mut holdings, dropped): (Vec<String>, Vec<String>) = previous
        .iter()
        .cloned()
        .partition(|ticker| period.contains(ticker));

    let mut added = Vec::new();
    for ticker in period.tickers() {
        if holdings.len() >= slots {
            break;
        }
        if !holdings.iter().any(|h| h == ticker) {
            holdings.push(ticker.to_string());
            added.push(ticker.to_string());
        }
    }

    PortfolioState {
        period_start: period.period_start,
        period_end: period.period_end,
        holdings,
        changes: HoldingChanges { added, dropped },
    }
}

/// One [`PortfolioState`] per ranked period. An empty input yields an empty
/// history.
pub fn rotate_portfolio(periods: &[RankedPeriod], slots: usize) -> Vec<PortfolioState> {
    let Some((first, rest)) = periods.split_first() else {
        return Vec::new();
    };

    let mut history = Vec::with_capacity(periods.len());
    history.push(initial_state(first, slots));

    for period in rest {
        let previous = &history[history.len() - 1].holdings;
        let state = next_state(previous, period, slots);
        if !state.changes.is_empty() {
            debug!(
                period_end = %state.period_end,
                added = ?state.changes.added,
                dropped = ?state.changes.dropped,
                "rotated holdings"
            );
        }
        history.push(state);
    }

    history
}
