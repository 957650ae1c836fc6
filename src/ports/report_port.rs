//! Report generation port trait.

use crate::domain::error::RotationError;
use crate::domain::ranking::RankedPeriod;
use crate::domain::rotation::PortfolioState;
use crate::domain::simulation::{SimulationConfig, SimulationWeek};
use crate::domain::universe::Universe;

/// Port for rendering the three stage outputs as human-readable reports.
pub trait ReportPort {
    fn render_rolling(&self, periods: &[RankedPeriod], universe: &Universe) -> String;

    fn render_portfolio(&self, history: &[PortfolioState], periods: &[RankedPeriod]) -> String;

    fn render_dollar_return(
        &self,
        weeks: &[SimulationWeek],
        config: &SimulationConfig,
        benchmark: &str,
    ) -> String;

    /// Default implementation: writes the rendered report as-is.
    fn write(&self, content: &str, output_path: &std::path::Path) -> Result<(), RotationError> {
        std::fs::write(output_path, content)?;
        Ok(())
    }
}
