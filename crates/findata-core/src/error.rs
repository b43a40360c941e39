use thiserror::Error;

/// Validation errors raised while coercing raw tool arguments into domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker must start with an ASCII letter: '{ch}'")]
    TickerInvalidStart { ch: char },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("invalid period '{value}', expected one of annual, quarterly, ttm")]
    InvalidPeriod { value: String },
    #[error("invalid interval '{value}', expected one of minute, day, week, month, year")]
    InvalidInterval { value: String },

    #[error("date must be an ISO calendar date (YYYY-MM-DD): '{value}'")]
    InvalidDate { value: String },
    #[error("start_date {start} is after end_date {end}")]
    InvertedDateRange { start: String, end: String },

    #[error("expected a whole number, got '{value}'")]
    NotAnInteger { value: String },
    #[error("value must be greater than zero, got {value}")]
    NotPositive { value: i64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("expected {expected}, got {actual}")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Process configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {name} is not set")]
    MissingApiKey { name: &'static str },
    #[error("api key cannot be empty")]
    EmptyApiKey,
    #[error("base url must start with http:// or https://: '{value}'")]
    InvalidBaseUrl { value: String },
}
