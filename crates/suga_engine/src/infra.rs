//! Memo table for platform infrastructure modules.
//!
//! Infra modules are created on first reference, either from a token while
//! another module's properties are being resolved or when the orchestrator
//! walks the declared infra. Their own properties are resolved later, one
//! pending module at a time, so resolution never recurses through infra.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use suga_plugins::PluginManifest;
use suga_spec::ResourceBlueprint;

use crate::blueprint::BlueprintResolver;
use crate::error::{EngineError, EngineResult};
use crate::module::{ModuleKind, ResolvedModule};

#[derive(Debug, Default)]
pub struct InfraTable {
    modules: IndexMap<String, ResolvedModule>,
    manifests: HashMap<String, PluginManifest>,
    resolved: HashSet<String>,
}

impl InfraTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the infra module `name`, creating it on first use.
    pub fn resolve_or_get(
        &mut self,
        name: &str,
        resolver: &BlueprintResolver<'_>,
    ) -> EngineResult<&PluginManifest> {
        if !self.manifests.contains_key(name) {
            let blueprint = declared(resolver, name, None)?;
            let manifest = resolver
                .resolve_plugin(blueprint)
                .map_err(|e| e.in_resource(name))?;
            let reference = resolver.qualify(&blueprint.plugin)?;

            debug!("Created infra module {} from {}", name, reference);
            self.modules.insert(
                name.to_string(),
                ResolvedModule::new(
                    name,
                    ModuleKind::Infra,
                    reference.to_string(),
                    manifest.deployment.terraform.clone(),
                ),
            );
            self.manifests.insert(name.to_string(), manifest);
        }

        self.manifests
            .get(name)
            .ok_or_else(|| unresolved(name, None))
    }

    /// The next created module whose properties are still unresolved.
    pub fn next_pending(&self) -> Option<String> {
        self.modules
            .keys()
            .find(|name| !self.resolved.contains(*name))
            .cloned()
    }

    pub fn mark_resolved(&mut self, name: &str) {
        self.resolved.insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut ResolvedModule> {
        self.modules.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn into_modules(self) -> IndexMap<String, ResolvedModule> {
        self.modules
    }
}

/// The blueprint of a declared infra resource.
pub fn declared<'a>(
    resolver: &BlueprintResolver<'a>,
    name: &str,
    property: Option<&str>,
) -> EngineResult<&'a ResourceBlueprint> {
    resolver
        .platform()
        .infra
        .get(name)
        .ok_or_else(|| unresolved(name, property))
}

fn unresolved(name: &str, property: Option<&str>) -> EngineError {
    EngineError::UnresolvedReference {
        origin: "infra".to_string(),
        name: name.to_string(),
        property: property.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suga_plugins::LocalCatalogue;
    use suga_spec::{PlatformSpec, PluginRef};

    fn fixtures() -> (PlatformSpec, LocalCatalogue) {
        let platform = PlatformSpec::new("test")
            .with_infra("network", ResourceBlueprint::new(PluginRef::id("vpc")))
            .with_infra("broken", ResourceBlueprint::new(PluginRef::id("missing")));
        let catalogue = LocalCatalogue::new().with_plugin(
            PluginRef::id("vpc"),
            PluginManifest::resource("vpc", "./modules/vpc").with_output("vpc_id"),
        );
        (platform, catalogue)
    }

    #[test]
    fn test_resolve_once() {
        let (platform, catalogue) = fixtures();
        let resolver = BlueprintResolver::new(&platform, &catalogue);
        let mut table = InfraTable::new();

        assert!(table.resolve_or_get("network", &resolver).unwrap().exposes("vpc_id"));
        table.resolve_or_get("network", &resolver).unwrap();
        assert_eq!(table.len(), 1);

        assert_eq!(table.next_pending().as_deref(), Some("network"));
        table.mark_resolved("network");
        assert_eq!(table.next_pending(), None);
    }

    #[test]
    fn test_undeclared_infra() {
        let (platform, catalogue) = fixtures();
        let resolver = BlueprintResolver::new(&platform, &catalogue);
        let mut table = InfraTable::new();

        let err = table.resolve_or_get("cluster", &resolver).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnresolvedReference { ref name, .. } if name == "cluster"
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_plugin_is_reported_for_the_resource() {
        let (platform, catalogue) = fixtures();
        let resolver = BlueprintResolver::new(&platform, &catalogue);
        let mut table = InfraTable::new();

        let err = table.resolve_or_get("broken", &resolver).unwrap_err();
        assert!(matches!(err.kind(), EngineError::PluginNotFound { .. }));
        assert!(!table.contains("broken"));
    }
}
