//! CLI definition and dispatch.
//!
//! Every stage reads and writes JSON so stages can be run one at a time;
//! `run` chains them in-process from the closing-price store.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter::{
    self, PortfolioInput, BENCHMARK_PREFIX, DOLLAR_RETURN_PREFIX, PORTFOLIO_PREFIX,
    ROLLING_PREFIX, WEEKLY_PREFIX,
};
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::benchmark::BenchmarkSeries;
use crate::domain::config_validation::{validate_data_config, validate_strategy_config};
use crate::domain::error::RotationError;
use crate::domain::ranking::{
    rank_rolling_windows, RankedPeriod, RankingConfig, DEFAULT_LEADERBOARD_SIZE,
    DEFAULT_WINDOW_WEEKS,
};
use crate::domain::rotation::{rotate_portfolio, PortfolioState, DEFAULT_SLOTS};
use crate::domain::simulation::{simulate, SimulationConfig, SimulationWeek, DEFAULT_POSITION_SIZE};
use crate::domain::summary::SimulationSummary;
use crate::domain::universe::{parse_tickers, validate_universe, Universe, DEFAULT_BENCHMARK};
use crate::domain::weekly::{
    build_week_records, recent_weeks, WeekRecord, WeeklyChangeSeries, DEFAULT_RECENT_WEEKS,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "etfrotator", about = "Weekly momentum rotation across ETFs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build weekly performance records from the closing-price store
    Weekly {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the benchmark's weekly changes to this file
        #[arg(short, long)]
        benchmark: Option<PathBuf>,
    },
    /// Rank instruments over rolling windows of weekly performance
    Rank {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Rotate a portfolio through the ranked periods
    Rotate {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Simulate dollar returns of a portfolio history against the benchmark
    Simulate {
        #[arg(short, long)]
        weekly: PathBuf,
        /// Portfolio history, or rolling performance to rotate first
        #[arg(short, long)]
        portfolio: PathBuf,
        #[arg(short, long)]
        benchmark: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Run every stage and write dated outputs into the output directory
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in the closing-price store
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Weekly {
            config,
            output,
            benchmark,
        } => run_weekly(&config, output.as_deref(), benchmark.as_deref()),
        Command::Rank {
            input,
            config,
            output,
            report,
        } => run_rank(&input, config.as_deref(), output.as_deref(), report.as_deref()),
        Command::Rotate {
            input,
            config,
            output,
            report,
        } => run_rotate(&input, config.as_deref(), output.as_deref(), report.as_deref()),
        Command::Simulate {
            weekly,
            portfolio,
            benchmark,
            config,
            output,
            report,
        } => run_simulate(
            &weekly,
            &portfolio,
            benchmark.as_deref(),
            config.as_deref(),
            output.as_deref(),
            report.as_deref(),
        ),
        Command::Run { config } => run_all(&config),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { config } => run_list_tickers(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

/// Load and validate `path`; without a path every setting takes its default.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, RotationError> {
    let adapter = match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)?
        }
        None => FileConfigAdapter::empty(),
    };
    validate_strategy_config(&adapter)?;
    validate_data_config(&adapter)?;
    Ok(adapter)
}

fn get_count(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int(section, key, default as i64)).unwrap_or(default)
}

pub fn build_ranking_config(config: &dyn ConfigPort) -> RankingConfig {
    RankingConfig {
        window_weeks: get_count(config, "strategy", "window_weeks", DEFAULT_WINDOW_WEEKS),
        leaderboard_size: get_count(
            config,
            "strategy",
            "leaderboard_size",
            DEFAULT_LEADERBOARD_SIZE,
        ),
    }
}

pub fn build_simulation_config(config: &dyn ConfigPort) -> SimulationConfig {
    SimulationConfig {
        position_size: config.get_double("strategy", "position_size", DEFAULT_POSITION_SIZE),
        slots: get_count(config, "strategy", "slots", DEFAULT_SLOTS),
    }
}

/// The configured universe, or the built-in SPDR universe when no tickers
/// are listed.
pub fn build_universe(config: &dyn ConfigPort) -> Result<Universe, RotationError> {
    let benchmark = config
        .get_non_empty("universe", "benchmark")
        .unwrap_or_else(|| DEFAULT_BENCHMARK.to_string())
        .to_uppercase();

    match config.get_non_empty("universe", "tickers") {
        Some(list) => {
            let tickers = parse_tickers(&list).map_err(|e| RotationError::ConfigInvalid {
                section: "universe".into(),
                key: "tickers".into(),
                reason: e.to_string(),
            })?;
            Ok(Universe::from_tickers(tickers, benchmark))
        }
        None => Ok(Universe {
            benchmark,
            ..Universe::spdr_sectors()
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub price_dir: PathBuf,
    pub weeks: usize,
    pub align_to_friday: bool,
}

pub fn build_data_settings(config: &dyn ConfigPort) -> DataSettings {
    DataSettings {
        price_dir: config
            .get_non_empty("data", "price_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data")),
        weeks: get_count(config, "data", "weeks", DEFAULT_RECENT_WEEKS),
        align_to_friday: config.get_bool("data", "align_to_friday", true),
    }
}

pub fn output_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_non_empty("output", "dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output"))
}

/// Closes of every usable universe ticker, grouped into the most recent
/// `settings.weeks` week records.
pub fn build_weekly(
    data_port: &dyn DataPort,
    universe: &Universe,
    settings: &DataSettings,
) -> Result<Vec<WeekRecord>, RotationError> {
    let validation = validate_universe(data_port, universe)?;
    let records = build_week_records(&validation.closes, settings.align_to_friday)?;
    let records = recent_weeks(records, settings.weeks);
    info!(
        tickers = validation.universe.count(),
        weeks = records.len(),
        "built weekly performance"
    );
    Ok(records)
}

/// Weekly changes of the universe's benchmark. Unavailable data is a warning
/// and an empty series: the benchmark account then never moves.
pub fn load_benchmark(
    data_port: &dyn DataPort,
    universe: &Universe,
    settings: &DataSettings,
) -> BenchmarkSeries {
    match data_port.fetch_closes(&universe.benchmark) {
        Ok(closes) => {
            let series = BenchmarkSeries::from_closes(&closes, settings.align_to_friday);
            if series.is_empty() {
                warn!(benchmark = %universe.benchmark, "no benchmark changes available");
            }
            series
        }
        Err(e) => {
            warn!(benchmark = %universe.benchmark, error = %e, "benchmark unavailable");
            BenchmarkSeries::new()
        }
    }
}

fn run_weekly(
    config_path: &Path,
    output: Option<&Path>,
    benchmark_output: Option<&Path>,
) -> Result<(), RotationError> {
    let config = load_config(Some(config_path))?;
    let universe = build_universe(&config)?;
    let settings = build_data_settings(&config);
    let data_port = CsvAdapter::new(settings.price_dir.clone());

    let records = build_weekly(&data_port, &universe, &settings)?;
    json_adapter::emit_json(&records, output)?;
    if let Some(path) = output {
        info!(path = %path.display(), "weekly performance written");
    }

    if let Some(path) = benchmark_output {
        let benchmark = load_benchmark(&data_port, &universe, &settings);
        json_adapter::save_json(&benchmark, path)?;
        info!(path = %path.display(), weeks = benchmark.len(), "benchmark written");
    }
    Ok(())
}

/// Rank `records`, restricted to the configured tickers when the config
/// names them explicitly.
pub fn rank_stage(
    records: Vec<WeekRecord>,
    config: &dyn ConfigPort,
    universe: &Universe,
) -> Result<Vec<RankedPeriod>, RotationError> {
    let records = if config.get_non_empty("universe", "tickers").is_some() {
        universe.filter(records)
    } else {
        records
    };
    let ranking = build_ranking_config(config);
    let periods = rank_rolling_windows(&records, &ranking)?;
    info!(
        periods = periods.len(),
        window_weeks = ranking.window_weeks,
        leaderboard_size = ranking.leaderboard_size,
        "ranked rolling windows"
    );
    Ok(periods)
}

pub fn rotate_stage(periods: &[RankedPeriod], config: &dyn ConfigPort) -> Vec<PortfolioState> {
    let slots = build_simulation_config(config).slots;
    let history = rotate_portfolio(periods, slots);
    let rotations = history.iter().skip(1).filter(|s| !s.changes.is_empty()).count();
    info!(periods = history.len(), slots, rotations, "rotated portfolio");
    history
}

pub fn simulate_stage(
    records: Vec<WeekRecord>,
    history: &[PortfolioState],
    benchmark: &BenchmarkSeries,
    config: &dyn ConfigPort,
) -> Result<Vec<SimulationWeek>, RotationError> {
    let sim_config = build_simulation_config(config);
    let series = WeeklyChangeSeries::new(records);
    let weeks = simulate(&series, history, benchmark, &sim_config)?;

    match SimulationSummary::compute(&weeks, sim_config.initial_capital()) {
        Some(summary) => info!(
            weeks = summary.weeks,
            return_percent = summary.return_percent,
            benchmark_return_percent = summary.benchmark_return_percent,
            outperformance = summary.outperformance,
            "simulation complete"
        ),
        None => warn!("empty portfolio history, nothing simulated"),
    }
    Ok(weeks)
}

fn write_report(report: &str, path: Option<&Path>) -> Result<(), RotationError> {
    if let Some(path) = path {
        TextReportAdapter::new().write(report, path)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn run_rank(
    input: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
    report: Option<&Path>,
) -> Result<(), RotationError> {
    let config = load_config(config_path)?;
    let universe = build_universe(&config)?;
    let records: Vec<WeekRecord> = json_adapter::load_json(input)?;

    let periods = rank_stage(records, &config, &universe)?;
    json_adapter::emit_json(&periods, output)?;
    if report.is_some() {
        let text = TextReportAdapter::new().render_rolling(&periods, &universe);
        write_report(&text, report)?;
    }
    Ok(())
}

fn run_rotate(
    input: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
    report: Option<&Path>,
) -> Result<(), RotationError> {
    let config = load_config(config_path)?;
    let periods: Vec<RankedPeriod> = json_adapter::load_json(input)?;

    let history = rotate_stage(&periods, &config);
    json_adapter::emit_json(&history, output)?;
    if report.is_some() {
        let text = TextReportAdapter::new().render_portfolio(&history, &periods);
        write_report(&text, report)?;
    }
    Ok(())
}

fn run_simulate(
    weekly: &Path,
    portfolio: &Path,
    benchmark_path: Option<&Path>,
    config_path: Option<&Path>,
    output: Option<&Path>,
    report: Option<&Path>,
) -> Result<(), RotationError> {
    let config = load_config(config_path)?;
    let universe = build_universe(&config)?;
    let records: Vec<WeekRecord> = json_adapter::load_json(weekly)?;

    let history = match json_adapter::load_portfolio_input(portfolio)? {
        PortfolioInput::History(history) => history,
        PortfolioInput::Leaderboards(periods) => {
            info!("portfolio input holds rolling leaderboards, rotating first");
            rotate_stage(&periods, &config)
        }
    };

    let benchmark = match benchmark_path {
        Some(path) => json_adapter::load_json(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "benchmark unavailable");
            BenchmarkSeries::new()
        }),
        None => {
            let settings = build_data_settings(&config);
            load_benchmark(&CsvAdapter::new(settings.price_dir.clone()), &universe, &settings)
        }
    };

    let weeks = simulate_stage(records, &history, &benchmark, &config)?;
    json_adapter::emit_json(&weeks, output)?;
    if report.is_some() {
        let text = TextReportAdapter::new().render_dollar_return(
            &weeks,
            &build_simulation_config(&config),
            &universe.benchmark,
        );
        write_report(&text, report)?;
    }
    Ok(())
}

/// Paths written by [`run_pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineArtifacts {
    pub weekly: PathBuf,
    pub benchmark: PathBuf,
    pub rolling: PathBuf,
    pub portfolio: PathBuf,
    pub dollar_return: PathBuf,
    pub reports: Vec<PathBuf>,
}

/// Every stage in-process, writing files dated by the last week ending.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    out_dir: &Path,
) -> Result<PipelineArtifacts, RotationError> {
    let universe = build_universe(config)?;
    let settings = build_data_settings(config);

    let records = build_weekly(data_port, &universe, &settings)?;
    let Some(as_of) = records.last().map(|r| r.week_ending) else {
        return Err(RotationError::InsufficientData {
            weeks: 0,
            window: build_ranking_config(config).window_weeks,
        });
    };
    let benchmark = load_benchmark(data_port, &universe, &settings);

    let periods = rank_stage(records.clone(), config, &universe)?;
    let history = rotate_stage(&periods, config);
    let weeks = simulate_stage(records.clone(), &history, &benchmark, config)?;

    let dated = |prefix: &str, ext: &str| json_adapter::dated_path(out_dir, prefix, as_of, ext);
    let artifacts = PipelineArtifacts {
        weekly: dated(WEEKLY_PREFIX, "json"),
        benchmark: dated(BENCHMARK_PREFIX, "json"),
        rolling: dated(ROLLING_PREFIX, "json"),
        portfolio: dated(PORTFOLIO_PREFIX, "json"),
        dollar_return: dated(DOLLAR_RETURN_PREFIX, "json"),
        reports: vec![
            dated(&format!("report-{ROLLING_PREFIX}"), "txt"),
            dated(&format!("report-{PORTFOLIO_PREFIX}"), "txt"),
            dated(&format!("report-{DOLLAR_RETURN_PREFIX}"), "txt"),
        ],
    };

    json_adapter::save_json(&records, &artifacts.weekly)?;
    json_adapter::save_json(&benchmark, &artifacts.benchmark)?;
    json_adapter::save_json(&periods, &artifacts.rolling)?;
    json_adapter::save_json(&history, &artifacts.portfolio)?;
    json_adapter::save_json(&weeks, &artifacts.dollar_return)?;

    let reporter = TextReportAdapter::new();
    let reports = [
        reporter.render_rolling(&periods, &universe),
        reporter.render_portfolio(&history, &periods),
        reporter.render_dollar_return(&weeks, &build_simulation_config(config), &universe.benchmark),
    ];
    for (text, path) in reports.iter().zip(&artifacts.reports) {
        reporter.write(text, path)?;
    }

    info!(dir = %out_dir.display(), as_of = %as_of, "outputs written");
    Ok(artifacts)
}

fn run_all(config_path: &Path) -> Result<(), RotationError> {
    let config = load_config(Some(config_path))?;
    let settings = build_data_settings(&config);
    let data_port = CsvAdapter::new(settings.price_dir);
    run_pipeline(&data_port, &config, &output_dir(&config))?;
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), RotationError> {
    let config = load_config(Some(config_path))?;
    let ranking = build_ranking_config(&config);
    let sim = build_simulation_config(&config);
    let universe = build_universe(&config)?;
    let settings = build_data_settings(&config);

    info!(
        window_weeks = ranking.window_weeks,
        leaderboard_size = ranking.leaderboard_size,
        slots = sim.slots,
        position_size = sim.position_size,
        "strategy"
    );
    info!(
        tickers = %universe.tickers().join(", "),
        benchmark = %universe.benchmark,
        "universe"
    );
    info!(
        price_dir = %settings.price_dir.display(),
        weeks = settings.weeks,
        align_to_friday = settings.align_to_friday,
        "data"
    );
    info!("configuration is valid");
    Ok(())
}

fn run_list_tickers(config_path: &Path) -> Result<(), RotationError> {
    let config = load_config(Some(config_path))?;
    let settings = build_data_settings(&config);
    let tickers = CsvAdapter::new(settings.price_dir.clone()).list_tickers()?;

    if tickers.is_empty() {
        warn!(dir = %settings.price_dir.display(), "no price files found");
    }
    for ticker in &tickers {
        println!("{ticker}");
    }
    info!("{} tickers found", tickers.len());
    Ok(())
}
