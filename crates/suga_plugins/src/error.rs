//! Error types for plugin catalogues.

use std::path::PathBuf;
use thiserror::Error;

use crate::manifest::PluginKind;

/// Result type alias for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors that can occur while looking up or loading plugins.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin not found: {0}")]
    NotFound(String),

    #[error("Plugin {reference} is a {actual} plugin, expected a {expected} plugin")]
    KindMismatch {
        reference: String,
        expected: PluginKind,
        actual: PluginKind,
    },

    #[error("Invalid plugin manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("Catalogue unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
