//! Resolved deployment units.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use suga_spec::{ResourceType, Variable};

/// What a resolved module deploys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Service,
    Bucket,
    Database,
    Entrypoint,
    Identity,
    Infra,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Service => "service",
            ModuleKind::Bucket => "bucket",
            ModuleKind::Database => "database",
            ModuleKind::Entrypoint => "entrypoint",
            ModuleKind::Identity => "identity",
            ModuleKind::Infra => "infra",
        }
    }
}

impl From<ResourceType> for ModuleKind {
    fn from(resource_type: ResourceType) -> Self {
        match resource_type {
            ResourceType::Service => ModuleKind::Service,
            ResourceType::Bucket => ModuleKind::Bucket,
            ResourceType::Database => ModuleKind::Database,
            ResourceType::Entrypoint => ModuleKind::Entrypoint,
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One deployment module with its inputs fully resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedModule {
    pub name: String,
    /// Deployment module source from the plugin manifest
    pub source: String,
    pub kind: ModuleKind,
    /// Canonical plugin reference
    pub plugin: String,
    /// Module inputs in insertion order
    pub variables: IndexMap<String, Value>,
    /// Names of modules that must be deployed first
    pub depends_on: Vec<String>,
}

impl ResolvedModule {
    pub fn new(
        name: impl Into<String>,
        kind: ModuleKind,
        plugin: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            kind,
            plugin: plugin.into(),
            variables: IndexMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Add a dependency edge unless it is already present.
    pub fn add_dependency(&mut self, module: impl Into<String>) {
        let module = module.into();
        if !self.depends_on.contains(&module) {
            self.depends_on.push(module);
        }
    }
}

/// Everything the code generator needs for one stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResolvedStack {
    pub name: String,
    /// Platform variables
    pub variables: IndexMap<String, Variable>,
    /// Blueprint variables, keyed `<module>_<variable>`
    pub instance_variables: IndexMap<String, Variable>,
    /// One module per application resource
    pub modules: IndexMap<String, ResolvedModule>,
    /// Identity modules created for services
    pub identities: IndexMap<String, ResolvedModule>,
    /// Platform infrastructure modules
    pub infra: IndexMap<String, ResolvedModule>,
}

impl ResolvedStack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// All modules: application, then identity, then infra.
    pub fn all_modules(&self) -> impl Iterator<Item = &ResolvedModule> {
        self.modules
            .values()
            .chain(self.identities.values())
            .chain(self.infra.values())
    }

    pub fn module(&self, name: &str) -> Option<&ResolvedModule> {
        self.all_modules().find(|m| m.name == name)
    }

    /// Total number of dependency edges across the stack.
    pub fn edge_count(&self) -> usize {
        self.all_modules().map(|m| m.depends_on.len()).sum()
    }
}

/// Name of the variable that carries a blueprint variable for one module.
pub fn instance_variable_name(module: &str, variable: &str) -> String {
    format!("{}_{}", module, variable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies_are_deduplicated() {
        let mut module = ResolvedModule::new("api", ModuleKind::Service, "lambda", "./lambda");
        module.add_dependency("network");
        module.add_dependency("cluster");
        module.add_dependency("network");
        assert_eq!(module.depends_on, vec!["network", "cluster"]);
    }

    #[test]
    fn test_stack_lookup() {
        let mut stack = ResolvedStack::new("shop");
        let mut api = ResolvedModule::new("api", ModuleKind::Service, "lambda", "./lambda");
        api.add_dependency("network");
        stack.modules.insert("api".into(), api);
        stack.infra.insert(
            "network".into(),
            ResolvedModule::new("network", ModuleKind::Infra, "vpc", "./vpc"),
        );

        assert_eq!(stack.all_modules().count(), 2);
        assert_eq!(stack.module("network").map(|m| m.kind), Some(ModuleKind::Infra));
        assert_eq!(stack.edge_count(), 1);
    }
}
