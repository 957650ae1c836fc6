//! Domain error types.

/// Top-level error type for etfrotator.
///
/// Missing benchmark data and an empty rotation input are not errors: the
/// former means "no benchmark movement that week", the latter yields an empty
/// portfolio history.
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data: have {weeks} weeks, need at least {window}")]
    InsufficientData { weeks: usize, window: usize },

    #[error("portfolio period ending {period_end} has no matching week in the weekly series")]
    InconsistentPeriodAlignment { period_end: chrono::NaiveDate },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RotationError> for std::process::ExitCode {
    fn from(err: &RotationError) -> Self {
        let code: u8 = match err {
            RotationError::Io(_) => 1,
            RotationError::ConfigParse { .. }
            | RotationError::ConfigMissing { .. }
            | RotationError::ConfigInvalid { .. } => 2,
            RotationError::DataSource { .. } | RotationError::Json(_) => 3,
            RotationError::NoData { .. }
            | RotationError::InsufficientData { .. }
            | RotationError::InconsistentPeriodAlignment { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
