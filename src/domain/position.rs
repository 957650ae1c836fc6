//! Dollar positions held by the return simulator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub current_value: f64,
    pub entry_date: NaiveDate,
    pub entry_value: f64,
}

impl Position {
    pub fn open(ticker: &str, entry_date: NaiveDate, entry_value: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            current_value: entry_value,
            entry_date,
            entry_value,
        }
    }

    /// Compound one week's percent change into the position.
    pub fn apply_change(&mut self, change_percent: f64) {
        self.current_value *= 1.0 + change_percent / 100.0;
    }

    pub fn gain_loss(&self) -> f64 {
        self.current_value - self.entry_value
    }

    pub fn snapshot(&self, change_pct: Option<f64>) -> PositionSnapshot {
        PositionSnapshot {
            ticker: self.ticker.clone(),
            value: self.current_value,
            change_pct,
            entry_date: self.entry_date,
            entry_value: self.entry_value,
            gain_loss: self.gain_loss(),
        }
    }
}

/// A position as reported for one simulated week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub ticker: String,
    pub value: f64,
    /// `None` when the ticker had no data that week and its value carried over.
    pub change_pct: Option<f64>,
    pub entry_date: NaiveDate,
    pub entry_value: f64,
    pub gain_loss: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_position() -> Position {
        Position::open("XLK", NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(), 20_000.0)
    }

    #[test]
    fn open_starts_at_entry_value() {
        let pos = sample_position();
        assert_relative_eq!(pos.current_value, 20_000.0);
        assert_relative_eq!(pos.gain_loss(), 0.0);
    }

    #[test]
    fn apply_change_compounds() {
        let mut pos = sample_position();
        pos.apply_change(10.0);
        pos.apply_change(-10.0);
        assert_relative_eq!(pos.current_value, 19_800.0, epsilon = 1e-9);
        assert_relative_eq!(pos.gain_loss(), -200.0, epsilon = 1e-9);
    }

    #[test]
    fn snapshot_copies_fields() {
        let mut pos = sample_position();
        pos.apply_change(5.0);
        let snap = pos.snapshot(Some(5.0));
        assert_eq!(snap.ticker, "XLK");
        assert_relative_eq!(snap.value, 21_000.0, epsilon = 1e-9);
        assert_relative_eq!(snap.gain_loss, 1_000.0, epsilon = 1e-9);
        assert_eq!(snap.change_pct, Some(5.0));
        assert_eq!(snap.entry_date, pos.entry_date);
    }
}
