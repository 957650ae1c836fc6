//! Instrument universe for the rotation strategy.
//!
//! The universe is plain configuration passed into the pipeline, so several
//! universes can be run side by side. [`Universe::spdr_sectors`] is the
//! built-in default of SPDR sector and industry ETFs.

use crate::domain::error::RotationError;
use crate::domain::weekly::{PriceClose, WeekRecord};
use crate::ports::data_port::DataPort;
use std::collections::HashSet;
use tracing::{info, warn};

/// Two closes are needed for a single weekly change.
pub const MIN_WEEKLY_CLOSES: usize = 2;

pub const DEFAULT_BENCHMARK: &str = "SPY";

const SPDR_SECTOR_ETFS: [(&str, &str); 32] = [
    ("XRT", "SPDR S&P Retail ETF"),
    ("XSW", "SPDR S&P Software & Services ETF"),
    ("XTN", "SPDR S&P Transportation ETF"),
    ("XNTK", "SPDR NYSE Technology ETF"),
    ("XPH", "SPDR S&P Pharmaceuticals ETF"),
    ("XOP", "SPDR S&P Oil & Gas Exploration & Production ETF"),
    ("XES", "SPDR S&P Oil & Gas Equipment & Services ETF"),
    ("KRE", "SPDR S&P Regional Banking ETF"),
    ("KCE", "SPDR S&P Capital Markets ETF"),
    ("KIE", "SPDR S&P Insurance ETF"),
    ("XHS", "SPDR S&P Health Care Services ETF"),
    ("XHE", "SPDR S&P Health Care Equipment ETF"),
    ("KBE", "SPDR S&P Bank ETF"),
    ("RWR", "SPDR Dow Jones REIT ETF"),
    ("XBI", "SPDR S&P Biotech ETF"),
    ("XLB", "Materials Select Sector SPDR Fund"),
    ("XLI", "Industrial Select Sector SPDR Fund"),
    ("XLRE", "Real Estate Select Sector SPDR Fund"),
    ("XLU", "Utilities Select Sector SPDR Fund"),
    ("XLK", "Technology Select Sector SPDR Fund"),
    ("XLF", "Financial Select Sector SPDR Fund"),
    ("XLG", "Invesco S&P 500 Top 50 ETF"),
    ("XAR", "SPDR S&P Aerospace & Defense ETF"),
    ("XLC", "Communication Services Select Sector SPDR Fund"),
    ("XLP", "Consumer Staples Select Sector SPDR Fund"),
    ("XLV", "Health Care Select Sector SPDR Fund"),
    ("XME", "SPDR S&P Metals & Mining ETF"),
    ("XSD", "SPDR S&P Semiconductor ETF"),
    ("XTL", "SPDR S&P Telecom ETF"),
    ("XLY", "Consumer Discretionary Select Sector SPDR Fund"),
    ("XHB", "SPDR S&P Homebuilders ETF"),
    ("XLE", "Energy Select Sector SPDR Fund"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub ticker: String,
    pub name: String,
}

impl Instrument {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    pub instruments: Vec<Instrument>,
    pub benchmark: String,
}

impl Universe {
    pub fn spdr_sectors() -> Self {
        Self {
            instruments: SPDR_SECTOR_ETFS
                .iter()
                .map(|(ticker, name)| Instrument::new(*ticker, *name))
                .collect(),
            benchmark: DEFAULT_BENCHMARK.to_string(),
        }
    }

    /// A universe of `tickers`; names come from the built-in table when known.
    pub fn from_tickers(tickers: Vec<String>, benchmark: impl Into<String>) -> Self {
        let instruments = tickers
            .into_iter()
            .map(|ticker| {
                let name = builtin_name(&ticker).unwrap_or(ticker.as_str()).to_string();
                Instrument { ticker, name }
            })
            .collect();
        Self {
            instruments,
            benchmark: benchmark.into(),
        }
    }

    pub fn count(&self) -> usize {
        self.instruments.len()
    }

    pub fn tickers(&self) -> Vec<String> {
        self.instruments.iter().map(|i| i.ticker.clone()).collect()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.instruments.iter().any(|i| i.ticker == ticker)
    }

    pub fn name_of(&self, ticker: &str) -> Option<&str> {
        self.instruments
            .iter()
            .find(|i| i.ticker == ticker)
            .map(|i| i.name.as_str())
    }

    /// Drop observations of tickers outside the universe. Weeks left empty
    /// are kept so the week sequence itself is unchanged.
    pub fn filter(&self, records: Vec<WeekRecord>) -> Vec<WeekRecord> {
        records
            .into_iter()
            .map(|mut record| {
                record.observations.retain(|o| self.contains(&o.ticker));
                record
            })
            .collect()
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::spdr_sectors()
    }
}

fn builtin_name(ticker: &str) -> Option<&'static str> {
    SPDR_SECTOR_ETFS
        .iter()
        .find(|(t, _)| *t == ticker)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

pub struct UniverseValidationResult {
    pub universe: Universe,
    pub skipped: Vec<SkippedTicker>,
    pub closes: Vec<PriceClose>,
}

#[derive(Debug, Clone)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub enum SkipReason {
    NoData,
    InsufficientCloses { closes: usize },
}

/// Fetch every ticker of `universe`, keeping those with enough closes.
pub fn validate_universe(
    data_port: &dyn DataPort,
    universe: &Universe,
) -> Result<UniverseValidationResult, RotationError> {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();
    let mut closes = Vec::new();

    for instrument in &universe.instruments {
        let ticker = &instrument.ticker;
        let fetched = match data_port.fetch_closes(ticker) {
            Ok(data) => data,
            Err(e) => {
                warn!(%ticker, error = %e, "skipping ticker");
                skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if fetched.is_empty() {
            warn!(%ticker, "skipping ticker: no data found");
            skipped.push(SkippedTicker {
                ticker: ticker.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        if fetched.len() < MIN_WEEKLY_CLOSES {
            warn!(
                %ticker,
                closes = fetched.len(),
                minimum = MIN_WEEKLY_CLOSES,
                "skipping ticker: not enough closes"
            );
            skipped.push(SkippedTicker {
                ticker: ticker.clone(),
                reason: SkipReason::InsufficientCloses {
                    closes: fetched.len(),
                },
            });
            continue;
        }

        valid.push(instrument.clone());
        closes.extend(fetched);
    }

    if valid.is_empty() {
        return Err(RotationError::NoData {
            ticker: "all".to_string(),
        });
    }

    if !skipped.is_empty() {
        info!(
            "using {} of {} tickers",
            valid.len(),
            valid.len() + skipped.len()
        );
    }

    Ok(UniverseValidationResult {
        universe: Universe {
            instruments: valid,
            benchmark: universe.benchmark.clone(),
        },
        skipped,
        closes,
    })
}
