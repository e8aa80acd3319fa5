//! Per-file snapshot failures
//!
//! A failing snapshot is logged and skipped by the aggregator; it never aborts
//! the scan.

use thiserror::Error;

/// Reasons a single snapshot file could not be turned into target records
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O or gzip error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("top-level JSON value is {found}, expected an object")]
    NotAnObject { found: &'static str },

    #[error("`targets` is {found}, expected an array or null")]
    InvalidTargets { found: &'static str },

    #[error("target #{index} is {found}, expected an object")]
    InvalidTarget { index: usize, found: &'static str },
}

/// Short JSON type name used in error messages
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
