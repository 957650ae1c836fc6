//! Headline figures for a finished simulation.

use super::simulation::SimulationWeek;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub initial_capital: f64,
    pub capital_added: f64,
    pub total_capital_invested: f64,
    pub final_position_value: f64,
    pub cash_available: f64,
    pub total_assets: f64,
    pub net_gain_loss: f64,
    pub return_percent: f64,
    pub benchmark_capital_added: f64,
    pub benchmark_capital_invested: f64,
    pub benchmark_final_value: f64,
    pub benchmark_net_gain_loss: f64,
    pub benchmark_return_percent: f64,
    pub outperformance: f64,
    pub weeks: usize,
    pub weeks_ahead: usize,
    pub best_outperformance: f64,
    pub worst_outperformance: f64,
}

impl SimulationSummary {
    /// `None` when the simulation produced no weeks.
    pub fn compute(weeks: &[SimulationWeek], initial_capital: f64) -> Option<Self> {
        let last = weeks.last()?;

        let spreads: Vec<f64> = weeks.iter().map(SimulationWeek::outperformance).collect();
        let best = spreads.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst = spreads.iter().copied().fold(f64::INFINITY, f64::min);

        Some(Self {
            initial_capital,
            capital_added: last.total_capital_invested - initial_capital,
            total_capital_invested: last.total_capital_invested,
            final_position_value: last.total_position_value,
            cash_available: last.cash_available,
            total_assets: last.total_assets(),
            net_gain_loss: last.net_gain_loss,
            return_percent: last.return_percent,
            benchmark_capital_added: last.benchmark_capital_invested - initial_capital,
            benchmark_capital_invested: last.benchmark_capital_invested,
            benchmark_final_value: last.benchmark_value,
            benchmark_net_gain_loss: last.benchmark_net_gain_loss,
            benchmark_return_percent: last.benchmark_return_percent,
            outperformance: last.outperformance(),
            weeks: weeks.len(),
            weeks_ahead: spreads.iter().filter(|&&s| s > 0.0).count(),
            best_outperformance: best,
            worst_outperformance: worst,
        })
    }
}
