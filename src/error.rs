//! Error types for the logging codemod.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for codemod operations.
#[derive(Error, Debug)]
pub enum CodemodError {
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rule '{rule}' failed: {message}")]
    RuleApplication { rule: String, message: String },

    #[error("Cannot enumerate group '{group}' at {path}: {message}")]
    GroupEnumeration {
        group: String,
        path: PathBuf,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to install log subscriber: {0}")]
    Telemetry(String),
}

/// A specialized Result type for codemod operations.
pub type Result<T> = std::result::Result<T, CodemodError>;
