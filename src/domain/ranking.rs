//! Rolling-window momentum ranking.
//!
//! Every contiguous run of `window_weeks` week records becomes one
//! [`RankedPeriod`] whose leaderboard orders instruments by geometric-mean
//! weekly return, then by the number of positive weeks, then by ticker.

use crate::domain::error::RotationError;
use crate::domain::weekly::WeekRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_WINDOW_WEEKS: usize = 10;
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingConfig {
    pub window_weeks: usize,
    pub leaderboard_size: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            window_weeks: DEFAULT_WINDOW_WEEKS,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyChange {
    #[serde(rename = "change")]
    pub change_percent: f64,
    pub week_ending: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedInstrument {
    pub ticker: String,
    #[serde(rename = "geometric_avg")]
    pub geometric_mean_percent: Option<f64>,
    pub weeks_positive: usize,
    /// Change in the window's final week; `None` when the ticker was not
    /// observed that week.
    #[serde(rename = "most_recent_change")]
    pub most_recent_change_percent: Option<f64>,
    pub weekly_changes: Vec<WeeklyChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPeriod {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(rename = "top_10_etfs")]
    pub top_n: Vec<RankedInstrument>,
}

impl RankedPeriod {
    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.top_n.iter().map(|r| r.ticker.as_str())
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.top_n.iter().any(|r| r.ticker == ticker)
    }
}

/// `(Π(1 + rᵢ/100))^(1/n) − 1`, as a percentage.
///
/// `None` for an empty slice or a non-finite result.
pub fn geometric_mean(changes_percent: &[f64]) -> Option<f64> {
    if changes_percent.is_empty() {
        return None;
    }
    let product: f64 = changes_percent.iter().map(|r| 1.0 + r / 100.0).product();
    let n = changes_percent.len() as f64;
    let mean = (product.powf(1.0 / n) - 1.0) * 100.0;
    mean.is_finite().then_some(mean)
}

/// Leaderboard order: geometric mean descending with undefined last, then
/// weeks positive descending, then ticker ascending.
pub fn compare_ranked(a: &RankedInstrument, b: &RankedInstrument) -> Ordering {
    let by_mean = match (a.geometric_mean_percent, b.geometric_mean_percent) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_mean
        .then_with(|| b.weeks_positive.cmp(&a.weeks_positive))
        .then_with(|| a.ticker.cmp(&b.ticker))
}

/// Score every ticker present in `window`, sorted in leaderboard order.
pub fn rank_window(window: &[WeekRecord]) -> Vec<RankedInstrument> {
    let Some(last_week) = window.last().map(|w| w.week_ending) else {
        return Vec::new();
    };

    let mut changes: BTreeMap<&str, Vec<WeeklyChange>> = BTreeMap::new();
    let mut most_recent: BTreeMap<&str, f64> = BTreeMap::new();

    for week in window {
        for obs in &week.observations {
            let entry = changes.entry(obs.ticker.as_str()).or_default();
            let Some(change) = obs.change_percent else {
                continue;
            };
            entry.push(WeeklyChange {
                change_percent: change,
                week_ending: week.week_ending,
            });
            if week.week_ending == last_week {
                most_recent.insert(obs.ticker.as_str(), change);
            }
        }
    }

    let mut ranked: Vec<RankedInstrument> = changes
        .into_iter()
        .map(|(ticker, weekly_changes)| {
            let values: Vec<f64> = weekly_changes.iter().map(|w| w.change_percent).collect();
            RankedInstrument {
                ticker: ticker.to_string(),
                geometric_mean_percent: geometric_mean(&values),
                weeks_positive: values.iter().filter(|&&c| c > 0.0).count(),
                most_recent_change_percent: most_recent.get(ticker).copied(),
                weekly_changes,
            }
        })
        .collect();

    ranked.sort_by(compare_ranked);
    ranked
}

/// Slide a `window_weeks` window over `records` (ascending) and keep the top
/// `leaderboard_size` instruments of each window.
///
/// Produces `records.len() - window_weeks + 1` periods; fewer records than
/// the window is an [`RotationError::InsufficientData`] error.
pub fn rank_rolling_windows(
    records: &[WeekRecord],
    config: &RankingConfig,
) -> Result<Vec<RankedPeriod>, RotationError> {
    if config.window_weeks == 0 {
        return Err(RotationError::ConfigInvalid {
            section: "strategy".into(),
            key: "window_weeks".into(),
            reason: "window_weeks must be at least 1".into(),
        });
    }
    if records.len() < config.window_weeks {
        return Err(RotationError::InsufficientData {
            weeks: records.len(),
            window: config.window_weeks,
        });
    }

    let periods: Vec<RankedPeriod> = records
        .windows(config.window_weeks)
        .map(|window| {
            let mut top_n = rank_window(window);
            top_n.truncate(config.leaderboard_size);
            let period = RankedPeriod {
                period_start: window[0].week_ending,
                period_end: window[window.len() - 1].week_ending,
                top_n,
            };
            debug!(
                period_end = %period.period_end,
                leader = period.top_n.first().map(|r| r.ticker.as_str()).unwrap_or("-"),
                "ranked window"
            );
            period
        })
        .collect();

    Ok(periods)
}
