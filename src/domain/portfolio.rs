//! Capital accounts carried week to week by the return simulator.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::position::Position;

/// The strategy account: open positions, recycled sale cash and the running
/// total of capital put in.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash_available: f64,
    pub total_capital_invested: f64,
    pub positions: HashMap<String, Position>,
}

impl Portfolio {
    /// A funded account: the initial capital sits in cash until spent.
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash_available: initial_capital,
            total_capital_invested: initial_capital,
            positions: HashMap::new(),
        }
    }

    pub fn get_position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    pub fn has_position(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Liquidate at current value into cash. Returns the proceeds.
    pub fn sell(&mut self, ticker: &str) -> Option<f64> {
        let position = self.positions.remove(ticker)?;
        self.cash_available += position.current_value;
        Some(position.current_value)
    }

    /// Open a position of `size`, paying from cash first. Returns the new
    /// capital that had to be injected to cover any shortfall.
    pub fn buy(&mut self, ticker: &str, date: NaiveDate, size: f64) -> f64 {
        let injected = if self.cash_available >= size {
            self.cash_available -= size;
            0.0
        } else {
            let shortfall = size - self.cash_available;
            self.cash_available = 0.0;
            self.total_capital_invested += shortfall;
            shortfall
        };
        self.positions
            .insert(ticker.to_string(), Position::open(ticker, date, size));
        injected
    }

    pub fn total_position_value(&self) -> f64 {
        self.positions.values().map(|p| p.current_value).sum()
    }

    pub fn net_gain_loss(&self) -> f64 {
        self.total_position_value() + self.cash_available - self.total_capital_invested
    }

    pub fn return_percent(&self) -> f64 {
        percent_of(self.net_gain_loss(), self.total_capital_invested)
    }
}

/// The comparison account: a single holding of the benchmark that receives
/// the same capital injections as the strategy account.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkAccount {
    pub value: f64,
    pub capital_invested: f64,
}

impl BenchmarkAccount {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            value: initial_capital,
            capital_invested: initial_capital,
        }
    }

    pub fn inject(&mut self, amount: f64) {
        self.value += amount;
        self.capital_invested += amount;
    }

    pub fn apply_change(&mut self, change_percent: f64) {
        self.value *= 1.0 + change_percent / 100.0;
    }

    pub fn net_gain_loss(&self) -> f64 {
        self.value - self.capital_invested
    }

    pub fn return_percent(&self) -> f64 {
        percent_of(self.net_gain_loss(), self.capital_invested)
    }
}

fn percent_of(amount: f64, base: f64) -> f64 {
    if base > 0.0 {
        amount / base * 100.0
    } else {
        0.0
    }
}
