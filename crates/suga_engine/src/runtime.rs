//! Runtime plugin definitions forwarded to service builds.
//!
//! A service image is built with the runtime of its own plugin plus the
//! runtimes of every storage plugin the platform offers. Each runtime is a
//! Go module; `import` is its path without the version suffix.

use serde::{Deserialize, Serialize};

use suga_plugins::{PluginManifest, RuntimeModule};

use crate::error::{EngineError, EngineResult};

/// Alias the service runtime is imported under.
pub const SERVICE_ALIAS: &str = "svcPlugin";

/// One runtime import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoPlugin {
    pub alias: String,
    pub name: String,
    pub import: String,
}

impl GoPlugin {
    pub fn new(alias: impl Into<String>, name: impl Into<String>, go_module: &str) -> Self {
        Self {
            alias: alias.into(),
            name: name.into(),
            import: import_path(go_module).to_string(),
        }
    }
}

/// Runtimes a service build pulls in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginDefinition {
    pub service: GoPlugin,
    #[serde(default)]
    pub storage: Vec<GoPlugin>,
    /// Versioned modules to fetch
    #[serde(default)]
    pub gets: Vec<String>,
}

impl PluginDefinition {
    /// Start a definition from a service plugin, which must ship a runtime.
    pub fn for_service(service: &str, plugin: &PluginManifest) -> EngineResult<Self> {
        let runtime = plugin
            .runtime
            .as_ref()
            .ok_or_else(|| EngineError::MissingRuntime {
                service: service.to_string(),
                plugin: plugin.name.clone(),
            })?;

        Ok(Self {
            service: GoPlugin::new(SERVICE_ALIAS, "default", &runtime.go_module),
            storage: Vec::new(),
            gets: vec![runtime.go_module.clone()],
        })
    }

    pub fn with_storage(mut self, name: &str, runtime: &RuntimeModule) -> Self {
        self.storage.push(GoPlugin::new(
            format!("storage_{}", name),
            name,
            &runtime.go_module,
        ));
        self.gets.push(runtime.go_module.clone());
        self
    }
}

/// Module path without its `@version` suffix.
pub fn import_path(go_module: &str) -> &str {
    go_module
        .split_once('@')
        .map_or(go_module, |(path, _)| path)
}
