//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for quantbt.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
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

    #[error("no data for {symbol} between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("price data is missing required column '{field}'")]
    MissingField { field: String },

    #[error("column '{field}' appears more than once after header normalization")]
    DuplicateField { field: String },

    #[error("invalid {field} value {value:?} on row {row}")]
    InvalidField {
        field: String,
        value: String,
        row: usize,
    },

    #[error("non-positive close {close} on {date}")]
    NonPositiveClose { date: NaiveDate, close: f64 },

    #[error("duplicate bar for {date}")]
    DuplicateDate { date: NaiveDate },

    #[error("bars out of order: {date} follows {previous}")]
    UnorderedDates {
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QuantError {
    /// True for errors caused by the shape or content of the price data itself.
    pub fn is_malformed_data(&self) -> bool {
        self.exit_status() == 4
    }

    /// Process exit status: 1 I/O, 2 config, 4 malformed data, 5 no data.
    pub fn exit_status(&self) -> u8 {
        match self {
            QuantError::Io(_) | QuantError::Report { .. } => 1,
            QuantError::ConfigParse { .. }
            | QuantError::ConfigMissing { .. }
            | QuantError::ConfigInvalid { .. } => 2,
            QuantError::NoData { .. } => 5,
            QuantError::MissingField { .. }
            | QuantError::DuplicateField { .. }
            | QuantError::InvalidField { .. }
            | QuantError::NonPositiveClose { .. }
            | QuantError::DuplicateDate { .. }
            | QuantError::UnorderedDates { .. }
            | QuantError::DataSource { .. } => 4,
        }
    }
}

impl From<&QuantError> for std::process::ExitCode {
    fn from(err: &QuantError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
