//! JSON record files exchanged between the pipeline stages.

use crate::domain::error::RotationError;
use crate::domain::ranking::RankedPeriod;
use crate::domain::rotation::PortfolioState;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const WEEKLY_PREFIX: &str = "weekly-performance";
pub const ROLLING_PREFIX: &str = "rolling-performance";
pub const PORTFOLIO_PREFIX: &str = "portfolio-history";
pub const DOLLAR_RETURN_PREFIX: &str = "dollar-return";
pub const BENCHMARK_PREFIX: &str = "benchmark-performance";

/// The input accepted by the simulator: either a finished portfolio history
/// or rolling leaderboards that still need rotating. Told apart by shape:
/// history entries carry `portfolio`, leaderboard entries `top_10_etfs`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PortfolioInput {
    History(Vec<PortfolioState>),
    Leaderboards(Vec<RankedPeriod>),
}

pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    data: &T,
    path: P,
) -> Result<(), RotationError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, RotationError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Pretty JSON to `path`, or to stdout when no path is given.
pub fn emit_json<T: Serialize + ?Sized>(data: &T, path: Option<&Path>) -> Result<(), RotationError> {
    match path {
        Some(path) => save_json(data, path),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, data)?;
            handle.write_all(b"\n")?;
            Ok(())
        }
    }
}

pub fn load_portfolio_input<P: AsRef<Path>>(path: P) -> Result<PortfolioInput, RotationError> {
    load_json(path)
}

/// `<dir>/<prefix>-YYYY-MM-DD.<ext>`
pub fn dated_path(dir: &Path, prefix: &str, date: NaiveDate, ext: &str) -> PathBuf {
    dir.join(format!("{}-{}.{}", prefix, date.format("%Y-%m-%d"), ext))
}
