//! CSV closing-price store: one `<TICKER>.csv` per instrument.
//!
//! Files carry a header row with at least `date` and `close` columns; any
//! other columns (open, volume, adjusted close...) are ignored.

use crate::domain::error::RotationError;
use crate::domain::weekly::PriceClose;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CloseRow {
    date: NaiveDate,
    close: f64,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_closes(&self, ticker: &str) -> Result<Vec<PriceClose>, RotationError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RotationError::NoData {
                ticker: ticker.to_string(),
            },
            _ => RotationError::DataSource {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut closes = Vec::new();
        for result in rdr.deserialize::<CloseRow>() {
            let row = result.map_err(|e| RotationError::DataSource {
                reason: format!("{}: {}", path.display(), e),
            })?;
            closes.push(PriceClose {
                ticker: ticker.to_string(),
                date: row.date,
                close: row.close,
            });
        }

        closes.sort_by_key(|c| c.date);
        Ok(closes)
    }

    fn list_tickers(&self) -> Result<Vec<String>, RotationError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| RotationError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RotationError::DataSource {
                reason: format!("directory entry error: {e}"),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
