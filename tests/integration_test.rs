//! Integration tests across the ranking, rotation and simulation stages.
//!
//! Tests cover:
//! - The eleven-week, two-slot scenario where the leader drops out and a
//!   newcomer takes its slot
//! - Weekly records built from a mock data port, with skipped tickers
//! - JSON round-trips feeding the next stage
//! - Properties: period count, leaderboard bound, rotation bounds, capital
//!   conservation and benchmark parity

mod common;

use approx::assert_relative_eq;
use common::*;
use etfrotator::domain::benchmark::BenchmarkSeries;
use etfrotator::domain::error::RotationError;
use etfrotator::domain::ranking::{rank_rolling_windows, RankedPeriod, RankingConfig};
use etfrotator::domain::rotation::{rotate_portfolio, PortfolioState};
use etfrotator::domain::simulation::{simulate, SimulationConfig, SimulationWeek};
use etfrotator::domain::summary::SimulationSummary;
use etfrotator::domain::universe::{validate_universe, SkipReason, Universe};
use etfrotator::domain::weekly::{build_week_records, WeeklyChangeSeries};
use proptest::prelude::*;

/// Eleven weeks over eleven tickers. In the first window `A` leads and `B`
/// is 11th; in the second `A` collapses off the board and `B` leads.
fn leader_swap_records() -> Vec<WeekRecord> {
    let others: Vec<String> = (1..=9).map(|i| format!("C{i}")).collect();
    (0..11)
        .map(|i| {
            let mut entries = vec![
                obs("A", match i {
                    0 => 50.0,
                    10 => -50.0,
                    _ => 0.0,
                }),
                obs("B", if i == 10 { 100.0 } else { -1.0 }),
            ];
            for (n, ticker) in others.iter().enumerate() {
                entries.push(obs(ticker, (n + 1) as f64 * 0.25));
            }
            WeekRecord::new(week(i), entries)
        })
        .collect()
}

fn ten_by_ten() -> RankingConfig {
    RankingConfig {
        window_weeks: 10,
        leaderboard_size: 10,
    }
}

mod end_to_end {
    use super::*;

    #[test]
    fn leader_dropped_and_newcomer_added() {
        let records = leader_swap_records();
        let periods = rank_rolling_windows(&records, &ten_by_ten()).unwrap();
        assert_eq!(periods.len(), 2);

        assert_eq!(periods[0].top_n[0].ticker, "A");
        assert!(!periods[0].contains("B"));
        assert_eq!(periods[1].top_n[0].ticker, "B");
        assert!(!periods[1].contains("A"));

        let history = rotate_portfolio(&periods, 2);
        assert_eq!(history[0].holdings, vec!["A", "C9"]);
        assert_eq!(history[1].changes.dropped, vec!["A"]);
        assert_eq!(history[1].changes.added, vec!["B"]);
        assert_eq!(history[1].holdings, vec!["C9", "B"]);
    }

    #[test]
    fn simulation_recycles_proceeds_into_newcomer() {
        let records = leader_swap_records();
        let periods = rank_rolling_windows(&records, &ten_by_ten()).unwrap();
        let history = rotate_portfolio(&periods, 2);
        let series = WeeklyChangeSeries::new(records);
        let benchmark: BenchmarkSeries = [(week(9), 1.0), (week(10), 2.0)].into_iter().collect();
        let config = SimulationConfig {
            position_size: 20_000.0,
            slots: 2,
        };

        let weeks = simulate(&series, &history, &benchmark, &config).unwrap();
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_ending, week(9));

        // A was flat in week 9, so its proceeds cover B in full.
        let last = &weeks[1];
        assert_relative_eq!(last.capital_added_this_week, 0.0);
        assert_relative_eq!(last.total_capital_invested, 40_000.0);
        let b = last.positions.iter().find(|p| p.ticker == "B").unwrap();
        assert_relative_eq!(b.value, 40_000.0, epsilon = 1e-9);
        assert_eq!(b.entry_date, week(10));
        assert_relative_eq!(last.benchmark_value, 40_000.0 * 1.01 * 1.02, epsilon = 1e-6);

        let summary = SimulationSummary::compute(&weeks, config.initial_capital()).unwrap();
        assert_eq!(summary.weeks, 2);
        assert!(summary.outperformance > 0.0);
    }

    #[test]
    fn too_few_weeks_is_insufficient_data() {
        let records: Vec<WeekRecord> = leader_swap_records().into_iter().take(9).collect();
        let err = rank_rolling_windows(&records, &ten_by_ten()).unwrap_err();
        assert!(matches!(
            err,
            RotationError::InsufficientData { weeks: 9, window: 10 }
        ));
    }

    #[test]
    fn empty_ranking_yields_empty_simulation() {
        let history = rotate_portfolio(&[], 5);
        assert!(history.is_empty());
        let series = WeeklyChangeSeries::new(make_records(&[vec![("A", 1.0)]]));
        let weeks = simulate(
            &series,
            &history,
            &BenchmarkSeries::new(),
            &SimulationConfig::default(),
        )
        .unwrap();
        assert!(weeks.is_empty());
    }
}

mod weekly_from_data_port {
    use super::*;

    #[test]
    fn builds_records_and_skips_unusable_tickers() {
        let port = MockDataPort::new()
            .with_weekly_prices("XLK", date(2024, 1, 1), &[100.0, 110.0, 99.0])
            .with_weekly_prices("XLE", date(2024, 1, 1), &[50.0, 50.0, 55.0])
            .with_weekly_prices("XLU", date(2024, 1, 1), &[10.0])
            .with_error("XLF", "connection refused");
        let universe = Universe::from_tickers(
            vec!["XLK".into(), "XLE".into(), "XLU".into(), "XLF".into(), "XLV".into()],
            "SPY",
        );

        let validation = validate_universe(&port, &universe).unwrap();
        assert_eq!(validation.universe.tickers(), vec!["XLK", "XLE"]);
        assert_eq!(validation.skipped.len(), 3);
        assert!(validation.skipped.iter().any(|s| s.ticker == "XLU"
            && matches!(s.reason, SkipReason::InsufficientCloses { closes: 1 })));
        assert!(validation
            .skipped
            .iter()
            .any(|s| s.ticker == "XLV" && matches!(s.reason, SkipReason::NoData)));

        // Monday-stamped bars anchor to Friday.
        let records = build_week_records(&validation.closes, true).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].week_ending, date(2024, 1, 5));
        assert!(records[0].observations.iter().all(|o| o.change_percent.is_none()));
        assert_eq!(records[1].observations[0].ticker, "XLK");
        assert_relative_eq!(records[1].observations[0].change_percent.unwrap(), 10.0, epsilon = 1e-9);
        assert_eq!(records[2].observations[0].ticker, "XLE");
        assert_relative_eq!(records[2].observations[1].change_percent.unwrap(), -10.0, epsilon = 1e-9);
    }

    #[test]
    fn every_ticker_failing_is_no_data() {
        let port = MockDataPort::new().with_error("XLK", "boom");
        let universe = Universe::from_tickers(vec!["XLK".into()], "SPY");
        let err = validate_universe(&port, &universe).err().unwrap();
        assert!(matches!(err, RotationError::NoData { .. }));
    }

    #[test]
    fn benchmark_from_closes_tolerates_monday_stamps() {
        let closes = vec![
            PriceClose {
                ticker: "SPY".into(),
                date: date(2024, 1, 1),
                close: 400.0,
            },
            PriceClose {
                ticker: "SPY".into(),
                date: date(2024, 1, 8),
                close: 404.0,
            },
        ];
        let bench = BenchmarkSeries::from_closes(&closes, true);
        assert_eq!(bench.change_on(date(2024, 1, 1)), None);
        assert_relative_eq!(bench.change_on(date(2024, 1, 8)).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(bench.change_on(date(2024, 1, 12)).unwrap(), 1.0, epsilon = 1e-9);
    }
}

mod json_round_trip {
    use super::*;

    fn round_trip<T>(value: &T) -> T
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let json = serde_json::to_string_pretty(value).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn each_stage_reruns_identically_from_json() {
        let records = leader_swap_records();
        let periods = rank_rolling_windows(&records, &ten_by_ten()).unwrap();
        let records_back: Vec<WeekRecord> = round_trip(&records);
        assert_eq!(rank_rolling_windows(&records_back, &ten_by_ten()).unwrap(), periods);

        let history = rotate_portfolio(&periods, 2);
        let periods_back: Vec<RankedPeriod> = round_trip(&periods);
        assert_eq!(rotate_portfolio(&periods_back, 2), history);

        let benchmark: BenchmarkSeries = [(week(9), 0.5), (week(10), -0.25)].into_iter().collect();
        let config = SimulationConfig {
            position_size: 1_000.0,
            slots: 2,
        };
        let weeks = simulate(
            &WeeklyChangeSeries::new(records.clone()),
            &history,
            &benchmark,
            &config,
        )
        .unwrap();

        let history_back: Vec<PortfolioState> = round_trip(&history);
        let benchmark_back: BenchmarkSeries = round_trip(&benchmark);
        let weeks_again = simulate(
            &WeeklyChangeSeries::new(records_back),
            &history_back,
            &benchmark_back,
            &config,
        )
        .unwrap();
        assert_eq!(weeks_again, weeks);

        let weeks_back: Vec<SimulationWeek> = round_trip(&weeks);
        assert_eq!(weeks_back.len(), weeks.len());
        for (a, b) in weeks_back.iter().zip(&weeks) {
            assert_eq!(a.week_ending, b.week_ending);
            assert_relative_eq!(a.net_gain_loss, b.net_gain_loss, epsilon = 1e-9);
            assert_eq!(a.positions.len(), b.positions.len());
        }
    }

    #[test]
    fn undefined_values_serialize_as_null() {
        let records = make_records(&[vec![("A", 1.0)], vec![("B", 2.0)]]);
        let periods = rank_rolling_windows(
            &records,
            &RankingConfig {
                window_weeks: 2,
                leaderboard_size: 5,
            },
        )
        .unwrap();
        let json = serde_json::to_value(&periods).unwrap();
        let top = &json[0]["top_10_etfs"];
        let a = top
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["ticker"] == "A")
            .unwrap();
        assert!(a["most_recent_change"].is_null());
        assert_eq!(a["weekly_changes"][0]["change"], 1.0);
    }
}

fn arb_records(max_weeks: usize) -> impl Strategy<Value = Vec<WeekRecord>> {
    prop::collection::vec(
        prop::collection::vec(prop::option::weighted(0.85, -30.0f64..30.0), 5),
        1..=max_weeks,
    )
    .prop_map(|weeks| {
        weeks
            .into_iter()
            .enumerate()
            .map(|(i, changes)| {
                let observations = changes
                    .into_iter()
                    .enumerate()
                    .filter_map(|(t, change)| {
                        change.map(|c| obs(["A", "B", "C", "D", "E"][t], c))
                    })
                    .collect();
                WeekRecord::new(week(i), observations)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn emits_one_period_per_window(
        records in arb_records(20),
        window_weeks in 1usize..12,
        leaderboard_size in 1usize..6,
    ) {
        let config = RankingConfig { window_weeks, leaderboard_size };
        match rank_rolling_windows(&records, &config) {
            Ok(periods) => {
                prop_assert!(records.len() >= window_weeks);
                prop_assert_eq!(periods.len(), records.len() - window_weeks + 1);
                for (i, period) in periods.iter().enumerate() {
                    prop_assert!(period.top_n.len() <= leaderboard_size);
                    prop_assert_eq!(period.period_start, records[i].week_ending);
                    prop_assert_eq!(period.period_end, records[i + window_weeks - 1].week_ending);
                }
            }
            Err(RotationError::InsufficientData { weeks, window }) => {
                prop_assert!(records.len() < window_weeks);
                prop_assert_eq!(weeks, records.len());
                prop_assert_eq!(window, window_weeks);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn holdings_stay_within_slots_and_leaderboard(
        records in arb_records(16),
        window_weeks in 1usize..5,
        leaderboard_size in 1usize..6,
        slots_seed in 0usize..6,
    ) {
        prop_assume!(records.len() >= window_weeks);
        let slots = 1 + slots_seed % leaderboard_size;
        let periods = rank_rolling_windows(
            &records,
            &RankingConfig { window_weeks, leaderboard_size },
        ).unwrap();
        let history = rotate_portfolio(&periods, slots);

        prop_assert_eq!(history.len(), periods.len());
        for (state, period) in history.iter().zip(&periods) {
            prop_assert!(state.holdings.len() <= slots);
            prop_assert!(state.holdings.iter().all(|t| period.contains(t)));
            let mut unique = state.holdings.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), state.holdings.len());
        }
    }

    #[test]
    fn capital_is_conserved_and_benchmark_matches(
        records in arb_records(14),
        window_weeks in 1usize..4,
        slots in 1usize..4,
        bench_changes in prop::collection::vec(prop::option::of(-5.0f64..5.0), 14),
    ) {
        prop_assume!(records.len() >= window_weeks);
        let periods = rank_rolling_windows(
            &records,
            &RankingConfig { window_weeks, leaderboard_size: 4 },
        ).unwrap();
        let history = rotate_portfolio(&periods, slots);
        let benchmark: BenchmarkSeries = bench_changes
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|c| (week(i), c)))
            .collect();
        let config = SimulationConfig { position_size: 1_000.0, slots };
        let weeks = simulate(
            &WeeklyChangeSeries::new(records.clone()),
            &history,
            &benchmark,
            &config,
        ).unwrap();

        prop_assert_eq!(weeks.len(), records.len() - window_weeks + 1);
        for w in &weeks {
            let identity = w.total_position_value + w.cash_available - w.total_capital_invested;
            prop_assert!((identity - w.net_gain_loss).abs() < 1e-6);
            prop_assert!(w.cash_available >= 0.0);
            prop_assert!(w.total_capital_invested >= config.initial_capital());
            prop_assert!((w.benchmark_capital_invested - w.total_capital_invested).abs() < 1e-9);
            prop_assert!((w.benchmark_capital_added_this_week - w.capital_added_this_week).abs() < 1e-9);
        }
    }
}
