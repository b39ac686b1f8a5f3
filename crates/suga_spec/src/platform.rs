//! Platform spec models.
//!
//! A platform maps every abstract resource category (and its subtypes) to a
//! blueprint: the plugin that deploys it, the identities it needs, the
//! variables it declares and the properties handed to the plugin.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SpecError, SpecResult};
use crate::models::ResourceType;

/// Root platform specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformSpec {
    pub name: String,
    /// Library aliases, e.g. `aws: acme/aws@0.1.0`
    #[serde(default)]
    pub libraries: IndexMap<String, String>,
    /// Platform-level variables
    #[serde(default)]
    pub variables: IndexMap<String, Variable>,
    #[serde(default)]
    pub services: Option<CategorySpec>,
    #[serde(default)]
    pub buckets: Option<CategorySpec>,
    #[serde(default)]
    pub databases: Option<CategorySpec>,
    #[serde(default)]
    pub entrypoints: Option<CategorySpec>,
    /// Supporting infrastructure shared by resources
    #[serde(default)]
    pub infra: IndexMap<String, ResourceBlueprint>,
}

impl PlatformSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            libraries: IndexMap::new(),
            variables: IndexMap::new(),
            services: None,
            buckets: None,
            databases: None,
            entrypoints: None,
            infra: IndexMap::new(),
        }
    }

    pub fn with_category(mut self, resource_type: ResourceType, spec: CategorySpec) -> Self {
        match resource_type {
            ResourceType::Service => self.services = Some(spec),
            ResourceType::Bucket => self.buckets = Some(spec),
            ResourceType::Database => self.databases = Some(spec),
            ResourceType::Entrypoint => self.entrypoints = Some(spec),
        }
        self
    }

    pub fn with_infra(mut self, name: impl Into<String>, blueprint: ResourceBlueprint) -> Self {
        self.infra.insert(name.into(), blueprint);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    pub fn with_library(mut self, alias: impl Into<String>, reference: impl Into<String>) -> Self {
        self.libraries.insert(alias.into(), reference.into());
        self
    }

    /// The category spec for a resource type, if the platform supports it.
    pub fn category(&self, resource_type: ResourceType) -> Option<&CategorySpec> {
        match resource_type {
            ResourceType::Service => self.services.as_ref(),
            ResourceType::Bucket => self.buckets.as_ref(),
            ResourceType::Database => self.databases.as_ref(),
            ResourceType::Entrypoint => self.entrypoints.as_ref(),
        }
    }

    /// Parse a library alias into its team, name and version.
    pub fn library(&self, alias: &str) -> SpecResult<Library> {
        let value = self
            .libraries
            .get(alias)
            .ok_or_else(|| SpecError::LibraryNotFound(alias.to_string()))?;
        Library::parse(value).ok_or_else(|| SpecError::InvalidLibrary {
            alias: alias.to_string(),
            value: value.clone(),
        })
    }

    /// Expand `<library>/<plugin>` ids against the platform's libraries.
    ///
    /// Ids whose prefix is not a known library alias are returned as is.
    pub fn qualify(&self, reference: &PluginRef) -> SpecResult<PluginRef> {
        if let PluginRef::Id(id) = reference {
            if let Some((alias, plugin)) = id.split_once('/') {
                if self.libraries.contains_key(alias) {
                    let library = self.library(alias)?;
                    return Ok(PluginRef::Library {
                        team: library.team,
                        library: library.name,
                        version: library.version,
                        plugin: plugin.to_string(),
                    });
                }
            }
        }
        Ok(reference.clone())
    }
}

/// A plugin library pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub team: String,
    pub name: String,
    pub version: String,
}

impl Library {
    /// Parse `team/library@version`.
    pub fn parse(value: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"^(?P<team>[^/]+)/(?P<library>[^@]+)@(?P<version>.+)$")
                .expect("library pattern is valid")
        });

        let caps = re.captures(value)?;
        Some(Self {
            team: caps["team"].to_string(),
            name: caps["library"].to_string(),
            version: caps["version"].to_string(),
        })
    }
}

/// Blueprints for one resource category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySpec {
    /// Blueprint used when an intent names no subtype
    #[serde(flatten)]
    pub base: ResourceBlueprint,
    #[serde(default)]
    pub subtypes: IndexMap<String, ResourceBlueprint>,
}

impl CategorySpec {
    pub fn new(base: ResourceBlueprint) -> Self {
        Self {
            base,
            subtypes: IndexMap::new(),
        }
    }

    pub fn with_subtype(mut self, name: impl Into<String>, blueprint: ResourceBlueprint) -> Self {
        self.subtypes.insert(name.into(), blueprint);
        self
    }

    /// Names of declared subtypes, in declaration order.
    pub fn subtype_names(&self) -> Vec<String> {
        self.subtypes.keys().cloned().collect()
    }
}

/// Reference to a plugin in a catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum PluginRef {
    /// A flat plugin id, or `<library>/<plugin>` when the platform declares the library
    Id(String),
    Library {
        team: String,
        library: String,
        version: String,
        plugin: String,
    },
}

impl PluginRef {
    pub fn id(id: impl Into<String>) -> Self {
        PluginRef::Id(id.into())
    }

    /// The plugin name without library qualification.
    pub fn plugin_name(&self) -> &str {
        match self {
            PluginRef::Id(id) => id.rsplit('/').next().unwrap_or(id),
            PluginRef::Library { plugin, .. } => plugin,
        }
    }
}

impl std::fmt::Display for PluginRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginRef::Id(id) => write!(f, "{}", id),
            PluginRef::Library {
                team,
                library,
                version,
                plugin,
            } => write!(f, "{}/{}@{}/{}", team, library, version, plugin),
        }
    }
}

/// Maps a resource type/subtype to a concrete plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceBlueprint {
    pub plugin: PluginRef,
    /// Identity blueprints a service requires
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<ResourceBlueprint>,
    /// Variables scoped to each resolved instance
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, Variable>,
    /// `${infra.<name>}` tokens this blueprint must be deployed after
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Value>,
}

impl ResourceBlueprint {
    pub fn new(plugin: PluginRef) -> Self {
        Self {
            plugin,
            identities: Vec::new(),
            variables: IndexMap::new(),
            depends_on: Vec::new(),
            properties: IndexMap::new(),
        }
    }

    pub fn with_identity(mut self, identity: ResourceBlueprint) -> Self {
        self.identities.push(identity);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    pub fn with_dependency(mut self, token: impl Into<String>) -> Self {
        self.depends_on.push(token.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

/// A typed variable declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Variable {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub var_type: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
}

impl Variable {
    pub fn new(var_type: impl Into<String>) -> Self {
        Self {
            description: None,
            var_type: Some(var_type.into()),
            default: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}
