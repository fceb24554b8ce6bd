//! Error types for bizcast

use thiserror::Error;

use crate::models::TimeWindow;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No transaction data for {}", .window.label())]
    NoMatchingData { window: TimeWindow },

    #[error("Failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: String, reason: String },

    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error("Invalid normalization parameters: {0}")]
    InvalidParams(String),

    #[error("Model shape error: {0}")]
    ModelShape(String),

    #[error("Record source error: {0}")]
    RecordSource(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn artifact(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::ArtifactLoad {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Why a single transaction record was rejected during a scan.
///
/// These never escape the aggregator; they are counted and logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordParseError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),

    #[error("invalid number in `{field}`: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("record is not an object")]
    NotAnObject,

    #[error("malformed row: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
