use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RollcallError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl RollcallError {
    /// Short machine-friendly label used in JSON envelopes and audit lines.
    pub fn kind(&self) -> &'static str {
        match self {
            RollcallError::RusqliteError(_) => "storage",
            RollcallError::IoError(_) => "io",
            RollcallError::ConfigError(_) => "config",
            RollcallError::ValidationError(_) => "malformed_input",
            RollcallError::NotFound(_) => "not_found",
        }
    }
}
