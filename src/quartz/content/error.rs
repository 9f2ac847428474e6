use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type covering the failures that abort a sync run.
///
/// Parse problems inside individual records and failed remote lookups are
/// recovered where they happen and never surface here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when a CSV export cannot be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the configuration file is not valid TOML.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Raised when a path lookup pattern cannot be compiled.
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Raised when a remote lookup fails at the transport level.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a command needs a configuration section that is absent.
    #[error("missing [{0}] section in configuration")]
    MissingSection(&'static str),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl From<ureq::Error> for SyncError {
    fn from(error: ureq::Error) -> Self {
        SyncError::Http(error.to_string())
    }
}
