//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for billpulse.
#[derive(Debug, thiserror::Error)]
pub enum BillpulseError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("event input error: {reason}")]
    EventParse { reason: String },

    #[error("invalid predicted label: {label:?}")]
    InvalidLabel { label: String },

    #[error("unknown sector: {name:?}")]
    UnknownSector { name: String },

    #[error("no price data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data for {ticker}: have {points} points, need {minimum}")]
    InsufficientData {
        ticker: String,
        points: usize,
        minimum: usize,
    },

    #[error("no trading day for {ticker} near {date}")]
    NotFound { ticker: String, date: NaiveDate },

    #[error("division by zero: {context}")]
    DivisionByZero { context: String },

    #[error("invalid price data: {context}")]
    InvalidPrice { context: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BillpulseError> for std::process::ExitCode {
    fn from(err: &BillpulseError) -> Self {
        let code: u8 = match err {
            BillpulseError::Io(_) | BillpulseError::Report { .. } => 1,
            BillpulseError::ConfigParse { .. }
            | BillpulseError::ConfigMissing { .. }
            | BillpulseError::ConfigInvalid { .. } => 2,
            BillpulseError::Database { .. } | BillpulseError::DatabaseQuery { .. } => 3,
            BillpulseError::EventParse { .. }
            | BillpulseError::InvalidLabel { .. }
            | BillpulseError::UnknownSector { .. } => 4,
            BillpulseError::NoData { .. }
            | BillpulseError::InsufficientData { .. }
            | BillpulseError::NotFound { .. }
            | BillpulseError::DivisionByZero { .. }
            | BillpulseError::InvalidPrice { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
