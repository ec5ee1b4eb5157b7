//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for stocksim.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("data query error: {reason}")]
    DataQuery { reason: String },

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

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("no price data for {instruments} between {start_date} and {end_date}")]
    DataUnavailable {
        instruments: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },

    #[error("malformed price data: {reason}")]
    MalformedData { reason: String },

    #[error("end date {end_date} is before start date {start_date}")]
    InvalidDateRange {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },

    #[error("no trading days between {start_date} and {end_date}")]
    NoTradingDays {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },

    #[error("initial balance must be positive, got {0}")]
    InvalidBalance(f64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SimError> for std::process::ExitCode {
    fn from(err: &SimError) -> Self {
        let code: u8 = match err {
            SimError::Io(_) => 1,
            SimError::ConfigParse { .. }
            | SimError::ConfigMissing { .. }
            | SimError::ConfigInvalid { .. }
            | SimError::InvalidBalance(_) => 2,
            SimError::Data { .. } | SimError::DataQuery { .. } => 3,
            SimError::UnknownStrategy { .. } => 4,
            SimError::DataUnavailable { .. }
            | SimError::MalformedData { .. }
            | SimError::InvalidDateRange { .. }
            | SimError::NoTradingDays { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
