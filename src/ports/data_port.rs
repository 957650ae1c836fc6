//! Data access port trait: raw weekly closes per ticker.

use crate::domain::error::RotationError;
use crate::domain::weekly::PriceClose;

pub trait DataPort {
    /// Weekly closes for `ticker`, ascending by date. An unknown ticker is an
    /// error; a known ticker without rows is an empty vector.
    fn fetch_closes(&self, ticker: &str) -> Result<Vec<PriceClose>, RotationError>;

    fn list_tickers(&self) -> Result<Vec<String>, RotationError>;
}
