//! Error types for equip-insight.

use std::fmt;

/// All errors produced by equip-insight operations.
///
/// Only batch-level failures surface here. Row-level problems with numeric
/// fields are non-fatal and reported as
/// [`CoercionWarning`](crate::record::CoercionWarning)s instead.
#[derive(Debug, Clone, PartialEq)]
pub enum InsightError {
    /// The batch contains zero rows.
    EmptyInput,
    /// The payload is valid JSON but not an array of rows.
    NotAnArray,
    /// A payload element is not a JSON object.
    RowNotObject { row: usize },
    /// A payload row lacks one or more required logical fields.
    MissingFields { row: usize, missing: Vec<String> },
    /// The payload or configuration is not valid JSON.
    InvalidJson(String),
    /// CSV parsing failed.
    CsvParse { line: usize, message: String },
    /// A configuration value is out of range.
    InvalidConfig(String),
    /// The summary could not be serialized.
    Serialization(String),
}

impl fmt::Display for InsightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "dataset cannot be empty"),
            Self::NotAnArray => write!(f, "expected a JSON array of equipment records"),
            Self::RowNotObject { row } => write!(f, "row {row} is not a valid object"),
            Self::MissingFields { row, missing } => {
                write!(f, "row {row} missing fields: {}", missing.join(", "))
            }
            Self::InvalidJson(msg) => write!(f, "invalid JSON: {msg}"),
            Self::CsvParse { line, message } => {
                write!(f, "CSV parse error at line {line}: {message}")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Serialization(msg) => write!(f, "serialization failed: {msg}"),
        }
    }
}

impl std::error::Error for InsightError {}

impl From<serde_json::Error> for InsightError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            Self::InvalidJson(e.to_string())
        } else {
            Self::Serialization(e.to_string())
        }
    }
}
