#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use etfrotator::domain::error::RotationError;
use etfrotator::domain::ranking::{RankedInstrument, RankedPeriod};
pub use etfrotator::domain::weekly::{PriceClose, WeekRecord, WeeklyObservation};
use etfrotator::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceClose>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, ticker: &str, closes: Vec<PriceClose>) -> Self {
        self.data.insert(ticker.to_string(), closes);
        self
    }

    /// Weekly closes starting on `first`, one per week.
    pub fn with_weekly_prices(self, ticker: &str, first: NaiveDate, prices: &[f64]) -> Self {
        let closes = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceClose {
                ticker: ticker.to_string(),
                date: first + Duration::weeks(i as i64),
                close,
            })
            .collect();
        self.with_closes(ticker, closes)
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(&self, ticker: &str) -> Result<Vec<PriceClose>, RotationError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(RotationError::DataSource {
                reason: reason.clone(),
            });
        }
        self.data
            .get(ticker)
            .cloned()
            .ok_or_else(|| RotationError::NoData {
                ticker: ticker.to_string(),
            })
    }

    fn list_tickers(&self) -> Result<Vec<String>, RotationError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Friday 2024-01-05 plus `i` weeks.
pub fn week(i: usize) -> NaiveDate {
    date(2024, 1, 5) + Duration::weeks(i as i64)
}

pub fn obs(ticker: &str, change: f64) -> WeeklyObservation {
    WeeklyObservation {
        ticker: ticker.to_string(),
        price: 100.0,
        change_percent: Some(change),
    }
}

/// One record per entry of `weeks`, dated `week(0)`, `week(1)`, ...
pub fn make_records(weeks: &[Vec<(&str, f64)>]) -> Vec<WeekRecord> {
    weeks
        .iter()
        .enumerate()
        .map(|(i, entries)| {
            WeekRecord::new(week(i), entries.iter().map(|(t, c)| obs(t, *c)).collect())
        })
        .collect()
}

/// A leaderboard of `tickers` in the given rank order.
pub fn leaderboard(end: usize, tickers: &[&str]) -> RankedPeriod {
    RankedPeriod {
        period_start: week(end.saturating_sub(1)),
        period_end: week(end),
        top_n: tickers
            .iter()
            .map(|t| RankedInstrument {
                ticker: t.to_string(),
                geometric_mean_percent: Some(1.0),
                weeks_positive: 1,
                most_recent_change_percent: Some(1.0),
                weekly_changes: Vec::new(),
            })
            .collect(),
    }
}
