use std::io;
use thiserror::Error;

/// Errors surfaced past a component boundary.
///
/// Malformed submission content never shows up here: the extractor recovers
/// it locally and records a validation error instead.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("submission is not approved for materialization: {0}")]
    NotApproved(String),
    #[error("submission has no contact handle; cannot resolve author namespace")]
    MissingContact,
    #[error("analyzer unavailable: {0}")]
    AnalyzerUnavailable(String),
    #[error("analyzer timed out after {0}s")]
    AnalyzerTimeout(u64),
    #[error("package integrity check failed: expected checksum {expected}, computed {actual}")]
    PackageIntegrity { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, GateError>;
