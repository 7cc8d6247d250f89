//! Error types for Cartographer.

use thiserror::Error;

/// Errors raised by the storage, configuration and analysis layers.
///
/// Per-file extraction problems use [`crate::parser::ExtractionError`] instead;
/// they never escape a scan.
#[derive(Debug, Error)]
pub enum CartographerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("AI analysis failed: {0}")]
    Analysis(String),

    #[error("invalid graph id: {0:?}")]
    InvalidGraphId(String),
}

pub type Result<T> = std::result::Result<T, CartographerError>;
