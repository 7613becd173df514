use std::path::PathBuf;

use thiserror::Error;

/// Hard failures surfaced to callers as `error` sentinels.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Session directory not found: {}", .0.display())]
    StoreAbsent(PathBuf),

    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

/// Why a single log line could not be turned into an event.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event is not a JSON object")]
    NotAnObject,

    #[error("event has no type tag")]
    MissingType,
}
