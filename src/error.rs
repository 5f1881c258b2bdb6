//! Error types for the spot-cost library.
//!
//! Each failure domain gets its own enum so callers can tell a corrupt source
//! file apart from a report window that simply has no data.

use chrono::NaiveDateTime;
use thiserror::Error;

/// A source feed could not be turned into a series.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV row: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed archive document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: invalid timestamp '{value}' (expected format {format})")]
    InvalidTimestamp {
        line: u64,
        value: String,
        format: String,
    },

    #[error("line {line}: timestamp '{value}' is not on a full hour")]
    NotHourAligned { line: u64, value: String },

    #[error("unexpected production unit '{0}' (expected Wh)")]
    UnexpectedUnit(String),

    #[error("archive has no channel '{0}'")]
    MissingChannel(String),

    #[error("invalid sample offset '{0}' (expected seconds)")]
    InvalidOffset(String),
}

/// The solar profile cannot answer for the requested hour.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolarError {
    #[error("measured production covers year {supported} only, got {year}")]
    UnsupportedYear { year: i32, supported: i32 },

    #[error("measured production ranges overlap at {at}")]
    OverlappingRanges { at: NaiveDateTime },

    #[error("measured production at {at} lies outside the reference month {year}-{month:02}")]
    OutsideReferenceMonth {
        at: NaiveDateTime,
        year: i32,
        month: u32,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PriceError {
    #[error("no spot price for {at}")]
    Missing { at: NaiveDateTime },
}

/// A single report could not be produced. Other windows are unaffected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReportError {
    #[error("no consumption data since {since}")]
    EmptyRange { since: NaiveDateTime },

    #[error("total consumption since {since} is zero, spot rate is undefined")]
    ZeroConsumption { since: NaiveDateTime },

    #[error(transparent)]
    MissingPrice(#[from] PriceError),

    #[error(transparent)]
    Solar(#[from] SolarError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to load measured production: {0}")]
    Source(#[from] ParseError),

    #[error("failed to build solar profile: {0}")]
    Solar(#[from] SolarError),
}
