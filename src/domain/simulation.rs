//! Dollar-return simulation of the rotation strategy against a benchmark.
//!
//! Each slot is funded with a fixed entry size. Sale proceeds are recycled
//! into later purchases; only a cash shortfall adds new capital, and the
//! benchmark account receives exactly the same injections on the same week.
//!
//! Weekly order of operations:
//! 1. rotate when the week is the next portfolio period's end
//! 2. compound each held position by its change for the week
//! 3. compound the benchmark (after any injection that week)
//! 4. derive gain/loss and returns, then emit the week

use crate::domain::benchmark::BenchmarkSeries;
use crate::domain::error::RotationError;
use crate::domain::portfolio::{BenchmarkAccount, Portfolio};
use crate::domain::position::PositionSnapshot;
use crate::domain::rotation::{PortfolioState, DEFAULT_SLOTS};
use crate::domain::weekly::WeeklyChangeSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_POSITION_SIZE: f64 = 20_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Dollar amount committed to every newly opened position.
    pub position_size: f64,
    pub slots: usize,
}

impl SimulationConfig {
    pub fn initial_capital(&self) -> f64 {
        self.position_size * self.slots as f64
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            position_size: DEFAULT_POSITION_SIZE,
            slots: DEFAULT_SLOTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationWeek {
    pub week_ending: NaiveDate,
    pub total_position_value: f64,
    pub positions: Vec<PositionSnapshot>,
    pub cash_available: f64,
    pub total_capital_invested: f64,
    pub capital_added_this_week: f64,
    pub net_gain_loss: f64,
    pub return_percent: f64,
    pub benchmark_value: f64,
    pub benchmark_capital_invested: f64,
    pub benchmark_capital_added_this_week: f64,
    pub benchmark_net_gain_loss: f64,
    pub benchmark_return_percent: f64,
}

impl SimulationWeek {
    pub fn total_assets(&self) -> f64 {
        self.total_position_value + self.cash_available
    }

    pub fn outperformance(&self) -> f64 {
        self.return_percent - self.benchmark_return_percent
    }
}

/// Every period end must be a week of `weeks`, in strictly ascending order.
fn check_alignment(weeks: &[NaiveDate], history: &[PortfolioState]) -> Result<(), RotationError> {
    let mut previous: Option<NaiveDate> = None;
    for state in history {
        let misaligned = weeks.binary_search(&state.period_end).is_err()
            || previous.is_some_and(|p| state.period_end <= p);
        if misaligned {
            return Err(RotationError::InconsistentPeriodAlignment {
                period_end: state.period_end,
            });
        }
        previous = Some(state.period_end);
    }
    Ok(())
}

/// Simulate from the first period's end through the last week of `series`.
///
/// An empty `history` yields no weeks. A period end that is not one of the
/// series' weeks is an [`RotationError::InconsistentPeriodAlignment`] error.
pub fn simulate(
    series: &WeeklyChangeSeries,
    history: &[PortfolioState],
    benchmark: &BenchmarkSeries,
    config: &SimulationConfig,
) -> Result<Vec<SimulationWeek>, RotationError> {
    let Some(first) = history.first() else {
        return Ok(Vec::new());
    };

    let weeks = series.weeks();
    check_alignment(&weeks, history)?;
    let start_index = weeks.partition_point(|w| *w < first.period_end);

    let size = config.position_size;
    let mut portfolio = Portfolio::new(config.initial_capital());
    let mut bench = BenchmarkAccount::new(config.initial_capital());

    let mut opening_injection = 0.0;
    for ticker in &first.holdings {
        opening_injection += portfolio.buy(ticker, first.period_end, size);
    }
    bench.inject(opening_injection);

    let mut holdings: Vec<String> = first.holdings.clone();
    let mut next_period = 1;
    let mut results = Vec::with_capacity(weeks.len() - start_index);

    for (offset, &week_ending) in weeks[start_index..].iter().enumerate() {
        let mut capital_added = if offset == 0 { opening_injection } else { 0.0 };

        if let Some(state) = history.get(next_period).filter(|s| s.period_end == week_ending) {
            for ticker in holdings.iter().filter(|t| !state.holds(t)) {
                portfolio.sell(ticker);
            }
            for ticker in state.holdings.iter().filter(|t| !holdings.contains(t)) {
                let injected = portfolio.buy(ticker, week_ending, size);
                bench.inject(injected);
                capital_added += injected;
            }
            if capital_added > 0.0 {
                debug!(week = %week_ending, capital_added, "capital injected");
            }
            holdings = state.holdings.clone();
            next_period += 1;
        }

        let mut positions = Vec::with_capacity(holdings.len());
        for ticker in &holdings {
            if let Some(position) = portfolio.positions.get_mut(ticker) {
                let change = series.change(ticker, week_ending);
                if let Some(pct) = change {
                    position.apply_change(pct);
                }
                positions.push(position.snapshot(change));
            }
        }

        if let Some(pct) = benchmark.change_on(week_ending) {
            bench.apply_change(pct);
        }

        results.push(SimulationWeek {
            week_ending,
            total_position_value: portfolio.total_position_value(),
            positions,
            cash_available: portfolio.cash_available,
            total_capital_invested: portfolio.total_capital_invested,
            capital_added_this_week: capital_added,
            net_gain_loss: portfolio.net_gain_loss(),
            return_percent: portfolio.return_percent(),
            benchmark_value: bench.value,
            benchmark_capital_invested: bench.capital_invested,
            benchmark_capital_added_this_week: capital_added,
            benchmark_net_gain_loss: bench.net_gain_loss(),
            benchmark_return_percent: bench.return_percent(),
        });
    }

    Ok(results)
}
