//! Plain-text report adapter implementing ReportPort.
//!
//! Each report is a summary table followed by a per-period (or per-week)
//! breakdown. Undefined figures print as `n/a`.

use crate::domain::ranking::{RankedInstrument, RankedPeriod};
use crate::domain::rotation::PortfolioState;
use crate::domain::simulation::{SimulationConfig, SimulationWeek};
use crate::domain::summary::SimulationSummary;
use crate::domain::universe::Universe;
use crate::ports::report_port::ReportPort;

const NARROW: usize = 80;
const MEDIUM: usize = 100;
const WIDE: usize = 140;

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for TextReportAdapter {
    fn render_rolling(&self, periods: &[RankedPeriod], universe: &Universe) -> String {
        let leaderboard_size = periods.iter().map(|p| p.top_n.len()).max().unwrap_or(0);
        let mut output = banner(
            NARROW,
            &[
                "Rolling Performance Report",
                format!("Top {leaderboard_size} by Geometric Average").as_str(),
            ],
        );

        output.push_str(&format!("{:<30} | Leaderboard\n", "Period"));
        output.push_str(&rule('-', NARROW));
        for period in periods {
            let tickers: Vec<&str> = period.tickers().collect();
            output.push_str(&format!(
                "{:<30} | {}\n",
                period_label(period.period_start, period.period_end, " - "),
                tickers.join(", ")
            ));
        }
        output.push('\n');

        output.push_str(&banner(NARROW, &["Detailed Breakdown"]));
        for period in periods {
            output.push_str(&format!(
                "Period: {}\n",
                period_label(period.period_start, period.period_end, " to ")
            ));
            output.push_str(&render_leaderboard(&period.top_n, NARROW));
            output.push('\n');
        }

        output.push_str(&render_legend(periods, universe));
        output
    }

    fn render_portfolio(&self, history: &[PortfolioState], periods: &[RankedPeriod]) -> String {
        let slots = history.iter().map(|s| s.holdings.len()).max().unwrap_or(0);
        let mut output = banner(
            MEDIUM,
            &[
                "Running Portfolio Report",
                format!("Holds {slots} instruments with momentum rotation (by geometric average)")
                    .as_str(),
            ],
        );
        output.push_str("Rules:\n");
        output.push_str(&format!("  - Start with the top {slots} of the first period\n"));
        output.push_str("  - Keep holdings while they remain on the leaderboard\n");
        output.push_str("  - Drop holdings that fall off the leaderboard\n");
        output.push_str("  - Fill empty slots with the highest ranked instruments not already held\n\n");

        output.push_str(&format!(
            "{:<30} | {:<40} | Changes\n",
            "Period",
            format!("Portfolio ({slots})")
        ));
        output.push_str(&rule('-', MEDIUM));
        for (index, state) in history.iter().enumerate() {
            let changes = if index == 0 {
                "Initial".to_string()
            } else {
                describe_changes(state)
            };
            output.push_str(&format!(
                "{:<30} | {:<40} | {}\n",
                period_label(state.period_start, state.period_end, " - "),
                state.holdings.join(", "),
                changes
            ));
        }
        output.push('\n');

        output.push_str(&banner(MEDIUM, &["Detailed Period Breakdown"]));
        for state in history {
            output.push_str(&format!(
                "Period: {}\n",
                period_label(state.period_start, state.period_end, " to ")
            ));
            output.push_str(&rule('-', MEDIUM));
            output.push_str(&format!("Portfolio: {}\n", state.holdings.join(", ")));
            if state.changes.is_empty() {
                output.push_str("No changes from previous period\n");
            } else {
                if !state.changes.added.is_empty() {
                    output.push_str(&format!("Added:    {}\n", state.changes.added.join(", ")));
                }
                if !state.changes.dropped.is_empty() {
                    output.push_str(&format!("Dropped:  {}\n", state.changes.dropped.join(", ")));
                }
            }
            output.push('\n');
        }

        if !periods.is_empty() {
            output.push_str(&banner(MEDIUM, &["Leaderboard Reference Data"]));
            for period in periods {
                output.push_str(&format!(
                    "Period: {}\n",
                    period_label(period.period_start, period.period_end, " to ")
                ));
                output.push_str(&render_leaderboard(&period.top_n, MEDIUM));
                output.push('\n');
            }
        }

        output
    }

    fn render_dollar_return(
        &self,
        weeks: &[SimulationWeek],
        config: &SimulationConfig,
        benchmark: &str,
    ) -> String {
        let mut output = banner(
            WIDE,
            &[
                "Running Portfolio Dollar Return Report",
                format!(
                    "{} per position, {} slots, benchmark {}",
                    fmt_currency(config.position_size),
                    config.slots,
                    benchmark
                )
                .as_str(),
            ],
        );

        let Some(summary) = SimulationSummary::compute(weeks, config.initial_capital()) else {
            output.push_str("No simulated weeks.\n");
            return output;
        };

        output.push_str(&render_summary(&summary, benchmark));
        output.push_str(&render_weekly_table(weeks, benchmark));
        output.push_str(&render_position_detail(weeks));
        output
    }
}

fn rule(ch: char, width: usize) -> String {
    let mut line: String = std::iter::repeat_n(ch, width).collect();
    line.push('\n');
    line
}

fn banner(width: usize, lines: &[&str]) -> String {
    let mut output = rule('=', width);
    for line in lines {
        output.push_str(line);
        output.push('\n');
    }
    output.push_str(&rule('=', width));
    output.push('\n');
    output
}

fn period_label(start: chrono::NaiveDate, end: chrono::NaiveDate, sep: &str) -> String {
    format!("{start}{sep}{end}")
}

fn fmt_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}%"),
        None => "n/a".to_string(),
    }
}

/// `$1,234.56`, with a leading minus for negative amounts.
fn fmt_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

fn describe_changes(state: &PortfolioState) -> String {
    let mut parts = Vec::new();
    if !state.changes.added.is_empty() {
        parts.push(format!("+{}", state.changes.added.join(", ")));
    }
    if !state.changes.dropped.is_empty() {
        parts.push(format!("-{}", state.changes.dropped.join(", ")));
    }
    if parts.is_empty() {
        "No changes".to_string()
    } else {
        parts.join(" ")
    }
}

fn render_leaderboard(top_n: &[RankedInstrument], width: usize) -> String {
    let mut output = rule('-', width);
    output.push_str(&format!(
        "{:<6} {:<8} {:>12} {:>16} {:>16}\n",
        "Rank", "Ticker", "Geo Avg %", "Weeks Positive", "Most Recent %"
    ));
    output.push_str(&rule('-', width));
    for (rank, entry) in top_n.iter().enumerate() {
        output.push_str(&format!(
            "{:<6} {:<8} {:>12} {:>16} {:>16}\n",
            rank + 1,
            entry.ticker,
            fmt_percent(entry.geometric_mean_percent),
            entry.weeks_positive,
            fmt_percent(entry.most_recent_change_percent)
        ));
    }
    output
}

fn render_legend(periods: &[RankedPeriod], universe: &Universe) -> String {
    let mut tickers: Vec<&str> = periods.iter().flat_map(|p| p.tickers()).collect();
    tickers.sort_unstable();
    tickers.dedup();
    if tickers.is_empty() {
        return String::new();
    }

    let mut output = banner(NARROW, &["Instruments"]);
    for ticker in tickers {
        let name = universe.name_of(ticker).unwrap_or(ticker);
        output.push_str(&format!("{ticker:<8} {name}\n"));
    }
    output.push('\n');
    output
}

fn render_summary(s: &SimulationSummary, benchmark: &str) -> String {
    let mut output = String::from("SUMMARY\n");
    output.push_str(&rule('-', WIDE));
    output.push_str("Portfolio Performance:\n");
    let rows = [
        ("Initial Capital", fmt_currency(s.initial_capital)),
        ("Capital Added", fmt_currency(s.capital_added)),
        ("Total Capital Invested", fmt_currency(s.total_capital_invested)),
        ("Final Portfolio Value", fmt_currency(s.final_position_value)),
        ("Cash Available", fmt_currency(s.cash_available)),
        ("Total Assets", fmt_currency(s.total_assets)),
        ("Net Gain/Loss", fmt_currency(s.net_gain_loss)),
        ("True Return", format!("{:.2}%", s.return_percent)),
    ];
    for (label, value) in rows {
        output.push_str(&format!("  {:<24}{:>16}\n", format!("{label}:"), value));
    }
    output.push('\n');

    output.push_str(&format!("{benchmark} Benchmark (Equal Capital Invested):\n"));
    let rows = [
        ("Initial Capital", fmt_currency(s.initial_capital)),
        ("Capital Added", fmt_currency(s.benchmark_capital_added)),
        ("Total Capital Invested", fmt_currency(s.benchmark_capital_invested)),
        ("Final Value", fmt_currency(s.benchmark_final_value)),
        ("Net Gain/Loss", fmt_currency(s.benchmark_net_gain_loss)),
        ("Return", format!("{:.2}%", s.benchmark_return_percent)),
    ];
    for (label, value) in rows {
        output.push_str(&format!("  {:<24}{:>16}\n", format!("{label}:"), value));
    }
    output.push('\n');

    output.push_str(&format!(
        "{:<26}{:>16}\n",
        "Outperformance:",
        format!("{:.2}%", s.outperformance)
    ));
    output.push_str(&format!("{:<26}{:>16}\n", "Number of Weeks:", s.weeks));
    output.push_str(&format!(
        "{:<26}{:>16}\n",
        "Weeks Ahead:",
        format!("{} of {}", s.weeks_ahead, s.weeks)
    ));
    output.push_str(&format!(
        "{:<26}{:>16}\n",
        "Best / Worst Spread:",
        format!("{:.2}% / {:.2}%", s.best_outperformance, s.worst_outperformance)
    ));
    output.push('\n');
    output
}

fn render_weekly_table(weeks: &[SimulationWeek], benchmark: &str) -> String {
    let mut output = banner(WIDE, &[format!("Weekly Portfolio Values vs {benchmark}").as_str()]);
    output.push_str(&format!(
        "{:<12} {:>16} {:>12} {:>16} {:>16} {:>12} {:>16} {:>12}\n",
        "Week",
        "Portfolio",
        "Port Return",
        "Port Capital",
        format!("{benchmark} Value"),
        format!("{benchmark} Return"),
        format!("{benchmark} Capital"),
        "Outperform"
    ));
    output.push_str(&rule('-', WIDE));
    for week in weeks {
        output.push_str(&format!(
            "{:<12} {:>16} {:>12} {:>16} {:>16} {:>12} {:>16} {:>12}\n",
            week.week_ending.to_string(),
            fmt_currency(week.total_position_value),
            format!("{:.2}%", week.return_percent),
            fmt_currency(week.total_capital_invested),
            fmt_currency(week.benchmark_value),
            format!("{:.2}%", week.benchmark_return_percent),
            fmt_currency(week.benchmark_capital_invested),
            format!("{:.2}%", week.outperformance())
        ));
    }
    output.push('\n');
    output
}

fn render_position_detail(weeks: &[SimulationWeek]) -> String {
    let mut output = banner(WIDE, &["Detailed Position Tracking"]);
    for week in weeks {
        output.push_str(&format!("Week Ending: {}\n", week.week_ending));
        output.push_str(&format!(
            "Portfolio Value: {} | Cash: {} | Capital Invested: {}\n",
            fmt_currency(week.total_position_value),
            fmt_currency(week.cash_available),
            fmt_currency(week.total_capital_invested)
        ));
        if week.capital_added_this_week > 0.0 {
            output.push_str(&format!(
                "*** Capital Added This Week: {} ***\n",
                fmt_currency(week.capital_added_this_week)
            ));
        }
        output.push_str(&rule('-', WIDE));
        output.push_str(&format!(
            "{:<8} {:>16} {:>14} {:>12} {:>16} {:>20}\n",
            "Ticker", "Current Value", "Week Change %", "Entry Date", "Entry Value", "Position Gain/Loss"
        ));
        output.push_str(&rule('-', WIDE));
        for pos in &week.positions {
            output.push_str(&format!(
                "{:<8} {:>16} {:>14} {:>12} {:>16} {:>20}\n",
                pos.ticker,
                fmt_currency(pos.value),
                fmt_percent(pos.change_pct),
                pos.entry_date.to_string(),
                fmt_currency(pos.entry_value),
                fmt_currency(pos.gain_loss)
            ));
        }
        output.push('\n');
    }
    output
}
