//! Configuration validation.
//!
//! Runs before any stage; missing keys fall back to their defaults, present
//! keys must be in range.

use crate::domain::error::RotationError;
use crate::domain::ranking::{DEFAULT_LEADERBOARD_SIZE, DEFAULT_WINDOW_WEEKS};
use crate::domain::rotation::DEFAULT_SLOTS;
use crate::domain::simulation::DEFAULT_POSITION_SIZE;
use crate::domain::universe::parse_tickers;
use crate::domain::weekly::DEFAULT_RECENT_WEEKS;
use crate::ports::config_port::ConfigPort;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RotationError> {
    validate_window_weeks(config)?;
    validate_leaderboard(config)?;
    validate_position_size(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), RotationError> {
    validate_recent_weeks(config)?;
    validate_tickers(config)?;
    validate_benchmark(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> RotationError {
    RotationError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_window_weeks(config: &dyn ConfigPort) -> Result<(), RotationError> {
    let value = config.get_int("strategy", "window_weeks", DEFAULT_WINDOW_WEEKS as i64);
    if value < 1 {
        return Err(invalid("strategy", "window_weeks", "window_weeks must be at least 1"));
    }
    Ok(())
}

fn validate_leaderboard(config: &dyn ConfigPort) -> Result<(), RotationError> {
    let size = config.get_int(
        "strategy",
        "leaderboard_size",
        DEFAULT_LEADERBOARD_SIZE as i64,
    );
    if size < 1 {
        return Err(invalid(
            "strategy",
            "leaderboard_size",
            "leaderboard_size must be at least 1",
        ));
    }

    let slots = config.get_int("strategy", "slots", DEFAULT_SLOTS as i64);
    if slots < 1 {
        return Err(invalid("strategy", "slots", "slots must be at least 1"));
    }
    if slots > size {
        return Err(invalid(
            "strategy",
            "slots",
            format!("slots ({slots}) must not exceed leaderboard_size ({size})"),
        ));
    }
    Ok(())
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), RotationError> {
    let value = config.get_double("strategy", "position_size", DEFAULT_POSITION_SIZE);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "strategy",
            "position_size",
            "position_size must be a positive dollar amount",
        ));
    }
    Ok(())
}

fn validate_recent_weeks(config: &dyn ConfigPort) -> Result<(), RotationError> {
    let weeks = config.get_int("data", "weeks", DEFAULT_RECENT_WEEKS as i64);
    if weeks < 1 {
        return Err(invalid("data", "weeks", "weeks must be at least 1"));
    }
    let window = config.get_int("strategy", "window_weeks", DEFAULT_WINDOW_WEEKS as i64);
    if weeks < window {
        return Err(invalid(
            "data",
            "weeks",
            format!("weeks ({weeks}) must cover at least one window of {window}"),
        ));
    }
    Ok(())
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), RotationError> {
    if let Some(tickers) = config.get_non_empty("universe", "tickers") {
        parse_tickers(&tickers).map_err(|e| invalid("universe", "tickers", e.to_string()))?;
    }
    Ok(())
}

fn validate_benchmark(config: &dyn ConfigPort) -> Result<(), RotationError> {
    match config.get_string("universe", "benchmark") {
        Some(b) if b.trim().is_empty() => Err(RotationError::ConfigMissing {
            section: "universe".to_string(),
            key: "benchmark".to_string(),
        }),
        _ => Ok(()),
    }
}
