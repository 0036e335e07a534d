//! Error types for profile extraction.

use thiserror::Error;

/// Failures surfaced by the extractor and its backend.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The caller handed over something that cannot be sent (bad data URI, empty file)
    #[error("Invalid input: {0}")]
    Input(String),

    /// The backend call failed (network, timeout, non-2xx status)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with something that is not the declared schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing credential or invalid client settings
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Reasons a session refuses to start a new extraction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("profile URL is empty")]
    EmptyUrl,

    #[error("an extraction is already in progress")]
    Busy,
}
