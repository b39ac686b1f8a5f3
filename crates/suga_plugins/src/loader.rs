//! Catalogue loading from a plugin directory.
//!
//! Two layouts are recognised below the root:
//!
//! - `<plugin>/manifest.yaml` registers a flat id `<plugin>`
//! - `<team>/<library>/<version>/<plugin>/manifest.yaml` registers
//!   `team/library@version/plugin`

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use suga_spec::PluginRef;

use crate::catalogue::LocalCatalogue;
use crate::error::{PluginError, PluginResult};
use crate::manifest::PluginManifest;

const MANIFEST_FILES: [&str; 2] = ["manifest.yaml", "manifest.yml"];

/// Loads plugin manifests from disk into a [`LocalCatalogue`].
pub struct CatalogueLoader {
    plugins_path: PathBuf,
}

impl CatalogueLoader {
    pub fn new(plugins_path: impl Into<PathBuf>) -> Self {
        Self {
            plugins_path: plugins_path.into(),
        }
    }

    /// Load every manifest below the plugins directory.
    ///
    /// Manifests that fail to parse or sit at an unrecognised depth are
    /// skipped with a warning.
    pub fn load_all(&self) -> PluginResult<LocalCatalogue> {
        let mut catalogue = LocalCatalogue::new();

        if !self.plugins_path.exists() {
            warn!("Plugins directory does not exist: {:?}", self.plugins_path);
            return Ok(catalogue);
        }

        for entry in WalkDir::new(&self.plugins_path)
            .min_depth(2)
            .max_depth(5)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_manifest = path
                .file_name()
                .map_or(false, |n| MANIFEST_FILES.iter().any(|m| n == *m));
            if !path.is_file() || !is_manifest {
                continue;
            }

            let Some(reference) = self.reference_for(path) else {
                warn!("Skipping manifest at unrecognised location {:?}", path);
                continue;
            };

            match Self::load_manifest(path) {
                Ok(manifest) => {
                    info!("Loaded plugin: {} ({})", manifest.name, reference);
                    catalogue.register(&reference, manifest);
                }
                Err(e) => {
                    warn!("Failed to load plugin from {:?}: {}", path, e);
                }
            }
        }

        Ok(catalogue)
    }

    /// Parse a single manifest file.
    pub fn load_manifest(path: &Path) -> PluginResult<PluginManifest> {
        debug!("Loading manifest from {:?}", path);
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| PluginError::InvalidManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Derive the catalogue reference from a manifest's directory.
    fn reference_for(&self, manifest_path: &Path) -> Option<PluginRef> {
        let plugin_dir = manifest_path.parent()?;
        let relative = plugin_dir.strip_prefix(&self.plugins_path).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        match parts.as_slice() {
            [plugin] => Some(PluginRef::Id(plugin.clone())),
            [team, library, version, plugin] => Some(PluginRef::Library {
                team: team.clone(),
                library: library.clone(),
                version: version.clone(),
                plugin: plugin.clone(),
            }),
            _ => None,
        }
    }
}
