//! Spec file reading utilities.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{SpecError, SpecResult};
use crate::models::ApplicationSpec;
use crate::platform::PlatformSpec;

/// Reader for application and platform spec files.
pub struct SpecReader;

impl SpecReader {
    /// Read an application spec from a YAML or JSON file.
    pub fn read_application(path: impl AsRef<Path>) -> SpecResult<ApplicationSpec> {
        Self::read_file(path.as_ref())
    }

    /// Read a platform spec from a YAML or JSON file.
    pub fn read_platform(path: impl AsRef<Path>) -> SpecResult<PlatformSpec> {
        Self::read_file(path.as_ref())
    }

    pub fn application_from_str(content: &str) -> SpecResult<ApplicationSpec> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn platform_from_str(content: &str) -> SpecResult<PlatformSpec> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn read_file<T: DeserializeOwned>(path: &Path) -> SpecResult<T> {
        if !path.exists() {
            return Err(SpecError::NotFound(path.to_path_buf()));
        }
        debug!("Reading spec from {:?}", path);

        let content = fs::read_to_string(path)?;
        let is_json = path.extension().map_or(false, |ext| ext == "json");

        // YAML is a superset of JSON, but serde_json gives better messages
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| SpecError::InvalidFormat {
            path: path.to_path_buf(),
            message,
        })
    }
}
