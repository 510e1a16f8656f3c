//! Error types for Anibus.
//!
//! Uses `thiserror` for ergonomic error definitions. Per-port failures are
//! deliberately absent: a port that cannot be reached simply yields no result.

use crate::types::PortError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scanning operations.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("unknown host {host}: {reason}")]
    UnknownHost { host: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown scan mode: {0}")]
    UnknownMode(String),

    #[error("no scan mode selected")]
    NoActiveMode,

    #[error("a scan is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors raised while reading configuration and registry files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
