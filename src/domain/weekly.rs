//! Weekly price-change observations and their per-week grouping.
//!
//! A [`WeekRecord`] holds every instrument observed in one calendar week. The
//! sequence is ascending and gap tolerant: a holiday week is simply absent.

use crate::domain::error::RotationError;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_RECENT_WEEKS: usize = 52;

/// One instrument's close for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyObservation {
    pub ticker: String,
    pub price: f64,
    /// Percent change against the previous observed week of the same ticker.
    /// `None` on a ticker's first week.
    #[serde(default)]
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekRecord {
    pub week_ending: NaiveDate,
    #[serde(rename = "etfs")]
    pub observations: Vec<WeeklyObservation>,
}

impl WeekRecord {
    pub fn new(week_ending: NaiveDate, mut observations: Vec<WeeklyObservation>) -> Self {
        observations.sort_by(compare_by_change_desc);
        Self {
            week_ending,
            observations,
        }
    }

    pub fn get(&self, ticker: &str) -> Option<&WeeklyObservation> {
        self.observations.iter().find(|o| o.ticker == ticker)
    }
}

/// Highest change first; undefined changes last; ticker breaks ties.
fn compare_by_change_desc(a: &WeeklyObservation, b: &WeeklyObservation) -> Ordering {
    match (a.change_percent, b.change_percent) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.ticker.cmp(&b.ticker))
}

/// Ascending week records plus a `(ticker, week) -> change` index.
#[derive(Debug, Clone, Default)]
pub struct WeeklyChangeSeries {
    records: Vec<WeekRecord>,
    changes: HashMap<String, HashMap<NaiveDate, f64>>,
}

impl WeeklyChangeSeries {
    pub fn new(mut records: Vec<WeekRecord>) -> Self {
        records.sort_by_key(|r| r.week_ending);

        let mut changes: HashMap<String, HashMap<NaiveDate, f64>> = HashMap::new();
        for record in &records {
            for obs in &record.observations {
                if let Some(change) = obs.change_percent {
                    changes
                        .entry(obs.ticker.clone())
                        .or_default()
                        .insert(record.week_ending, change);
                }
            }
        }

        Self { records, changes }
    }

    pub fn records(&self) -> &[WeekRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct week-ending dates, ascending.
    pub fn weeks(&self) -> Vec<NaiveDate> {
        let mut weeks: Vec<NaiveDate> = self.records.iter().map(|r| r.week_ending).collect();
        weeks.dedup();
        weeks
    }

    pub fn change(&self, ticker: &str, week_ending: NaiveDate) -> Option<f64> {
        self.changes
            .get(ticker)
            .and_then(|by_week| by_week.get(&week_ending))
            .copied()
    }

    pub fn into_records(self) -> Vec<WeekRecord> {
        self.records
    }
}

impl From<Vec<WeekRecord>> for WeeklyChangeSeries {
    fn from(records: Vec<WeekRecord>) -> Self {
        Self::new(records)
    }
}

/// A raw weekly close as delivered by a [`DataPort`](crate::ports::data_port::DataPort).
#[derive(Debug, Clone, PartialEq)]
pub struct PriceClose {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
}

/// The Friday of the week containing `date`. Weekly bars are commonly stamped
/// with the Monday that opens the week.
pub fn friday_anchor(date: NaiveDate) -> NaiveDate {
    let weekday = date.weekday().num_days_from_monday() as i64;
    let days_until_friday = (4 - weekday).rem_euclid(7);
    date + Duration::days(days_until_friday)
}

/// Turn raw closes into ascending week records.
///
/// Closes are grouped per ticker; when several closes of one ticker fall in
/// the same (anchored) week only the latest is kept. Each change is taken
/// against the same ticker's previous kept close.
pub fn build_week_records(
    closes: &[PriceClose],
    align_to_friday: bool,
) -> Result<Vec<WeekRecord>, RotationError> {
    let mut per_ticker: BTreeMap<&str, BTreeMap<NaiveDate, (NaiveDate, f64)>> = BTreeMap::new();

    for bar in closes {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(RotationError::DataSource {
                reason: format!("invalid close {} for {} on {}", bar.close, bar.ticker, bar.date),
            });
        }
        let week = if align_to_friday {
            friday_anchor(bar.date)
        } else {
            bar.date
        };
        let slot = per_ticker
            .entry(bar.ticker.as_str())
            .or_default()
            .entry(week)
            .or_insert((bar.date, bar.close));
        if bar.date >= slot.0 {
            *slot = (bar.date, bar.close);
        }
    }

    let mut weeks: BTreeMap<NaiveDate, Vec<WeeklyObservation>> = BTreeMap::new();
    for (ticker, by_week) in per_ticker {
        let mut prev_close: Option<f64> = None;
        for (week, (_, close)) in by_week {
            let change_percent = prev_close.map(|prev| (close / prev - 1.0) * 100.0);
            weeks.entry(week).or_default().push(WeeklyObservation {
                ticker: ticker.to_string(),
                price: close,
                change_percent,
            });
            prev_close = Some(close);
        }
    }

    Ok(weeks
        .into_iter()
        .map(|(week_ending, observations)| WeekRecord::new(week_ending, observations))
        .collect())
}

/// Keep only the most recent `weeks` records.
pub fn recent_weeks(mut records: Vec<WeekRecord>, weeks: usize) -> Vec<WeekRecord> {
    if records.len() > weeks {
        records.drain(..records.len() - weeks);
    }
    records
}
