//! Weekly percent-change lookup for the reference instrument.

use crate::domain::weekly::{friday_anchor, PriceClose};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `week_ending -> change_percent`, possibly sparse. A missing week means the
/// benchmark did not move that week, never a zero return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkSeries {
    changes: BTreeMap<NaiveDate, f64>,
}

impl BenchmarkSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from weekly closes of the benchmark. Each change is registered
    /// under the bar date and, when `align_to_friday` is set and it differs,
    /// under the Friday of that week so lookups tolerate either stamping.
    pub fn from_closes(closes: &[PriceClose], align_to_friday: bool) -> Self {
        let mut sorted: Vec<&PriceClose> = closes
            .iter()
            .filter(|c| c.close.is_finite() && c.close > 0.0)
            .collect();
        sorted.sort_by_key(|c| c.date);

        let mut series = Self::new();
        for pair in sorted.windows(2) {
            let change = (pair[1].close / pair[0].close - 1.0) * 100.0;
            series.insert(pair[1].date, change);
            if align_to_friday {
                let anchor = friday_anchor(pair[1].date);
                if anchor != pair[1].date {
                    series.changes.entry(anchor).or_insert(change);
                }
            }
        }
        series
    }

    pub fn insert(&mut self, week_ending: NaiveDate, change_percent: f64) {
        if change_percent.is_finite() {
            self.changes.insert(week_ending, change_percent);
        }
    }

    pub fn change_on(&self, week_ending: NaiveDate) -> Option<f64> {
        self.changes.get(&week_ending).copied()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl FromIterator<(NaiveDate, f64)> for BenchmarkSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        let mut series = Self::new();
        for (date, change) in iter {
            series.insert(date, change);
        }
        series
    }
}
