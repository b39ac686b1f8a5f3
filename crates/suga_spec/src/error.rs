//! Error types for the spec module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while reading or interpreting specs.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Spec file not found at path: {0}")]
    NotFound(PathBuf),

    #[error("Invalid spec format in file {path}: {message}")]
    InvalidFormat { path: PathBuf, message: String },

    #[error("Library {0} not found in platform spec")]
    LibraryNotFound(String),

    #[error("Invalid library reference for {alias}: {value} (expected team/library@version)")]
    InvalidLibrary { alias: String, value: String },

    #[error("Spec validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
