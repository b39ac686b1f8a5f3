//! Plugin catalogues.
//!
//! A catalogue maps plugin references to manifests. The engine only sees the
//! [`PluginCatalogue`] trait, so catalogues backed by a directory, an
//! embedded bundle or a remote registry are interchangeable.

use std::collections::HashMap;

use tracing::debug;

use suga_spec::PluginRef;

use crate::error::{PluginError, PluginResult};
use crate::manifest::{PluginKind, PluginManifest};

/// Source of plugin manifests.
///
/// Lookups are synchronous from the caller's point of view. Retry and
/// timeout policy belongs to implementations backed by a remote service.
pub trait PluginCatalogue: Send + Sync {
    /// Look up a manifest of any kind.
    fn get_plugin(&self, reference: &PluginRef) -> PluginResult<PluginManifest>;

    /// Look up a manifest that must be a resource plugin.
    fn get_resource_plugin(&self, reference: &PluginRef) -> PluginResult<PluginManifest> {
        expect_kind(reference, self.get_plugin(reference)?, PluginKind::Resource)
    }

    /// Look up a manifest that must be an identity plugin.
    fn get_identity_plugin(&self, reference: &PluginRef) -> PluginResult<PluginManifest> {
        expect_kind(reference, self.get_plugin(reference)?, PluginKind::Identity)
    }
}

fn expect_kind(
    reference: &PluginRef,
    manifest: PluginManifest,
    expected: PluginKind,
) -> PluginResult<PluginManifest> {
    let actual = manifest.kind();
    if actual != expected {
        return Err(PluginError::KindMismatch {
            reference: reference.to_string(),
            expected,
            actual,
        });
    }
    Ok(manifest)
}

/// In-memory catalogue keyed by the canonical form of each reference.
#[derive(Debug, Clone, Default)]
pub struct LocalCatalogue {
    plugins: HashMap<String, PluginManifest>,
}

impl LocalCatalogue {
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Register a manifest under an explicit reference.
    pub fn register(&mut self, reference: &PluginRef, manifest: PluginManifest) {
        let key = reference.to_string();
        debug!("Registering plugin: {}", key);
        self.plugins.insert(key, manifest);
    }

    /// Register a manifest under its own name as a flat id.
    pub fn register_named(&mut self, manifest: PluginManifest) {
        let reference = PluginRef::id(manifest.name.clone());
        self.register(&reference, manifest);
    }

    pub fn with_plugin(mut self, reference: PluginRef, manifest: PluginManifest) -> Self {
        self.register(&reference, manifest);
        self
    }

    pub fn contains(&self, reference: &PluginRef) -> bool {
        self.plugins.contains_key(&reference.to_string())
    }

    /// Registered references, sorted.
    pub fn references(&self) -> Vec<&str> {
        let mut refs: Vec<_> = self.plugins.keys().map(|k| k.as_str()).collect();
        refs.sort_unstable();
        refs
    }

    /// Registered references with their manifests, sorted by reference.
    pub fn entries(&self) -> Vec<(&str, &PluginManifest)> {
        let mut entries: Vec<_> = self
            .plugins
            .iter()
            .map(|(k, m)| (k.as_str(), m))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl PluginCatalogue for LocalCatalogue {
    fn get_plugin(&self, reference: &PluginRef) -> PluginResult<PluginManifest> {
        self.plugins
            .get(&reference.to_string())
            .cloned()
            .ok_or_else(|| PluginError::NotFound(reference.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> LocalCatalogue {
        LocalCatalogue::new()
            .with_plugin(
                PluginRef::id("lambda"),
                PluginManifest::resource("lambda", "./modules/lambda"),
            )
            .with_plugin(
                PluginRef::Library {
                    team: "acme".into(),
                    library: "aws".into(),
                    version: "0.1.0".into(),
                    plugin: "iam-role".into(),
                },
                PluginManifest::identity("iam-role", "./modules/iam-role", "aws:iam:role"),
            )
    }

    #[test]
    fn test_lookup_by_reference() {
        let catalogue = catalogue();
        assert_eq!(catalogue.len(), 2);

        let lambda = catalogue.get_resource_plugin(&PluginRef::id("lambda")).unwrap();
        assert_eq!(lambda.name, "lambda");

        let role = catalogue
            .get_identity_plugin(&PluginRef::id("acme/aws@0.1.0/iam-role"))
            .unwrap();
        assert_eq!(role.identity_type(), Some("aws:iam:role"));
    }

    #[test]
    fn test_entries_sorted() {
        let catalogue = catalogue();
        let names: Vec<_> = catalogue
            .entries()
            .into_iter()
            .map(|(reference, manifest)| (reference, manifest.kind()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("acme/aws@0.1.0/iam-role", PluginKind::Identity),
                ("lambda", PluginKind::Resource),
            ]
        );
    }

    #[test]
    fn test_not_found() {
        let err = catalogue()
            .get_plugin(&PluginRef::id("fargate"))
            .unwrap_err();
        assert!(matches!(err, PluginError::NotFound(r) if r == "fargate"));
    }

    #[test]
    fn test_kind_mismatch() {
        let err = catalogue()
            .get_identity_plugin(&PluginRef::id("lambda"))
            .unwrap_err();

        match err {
            PluginError::KindMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, PluginKind::Identity);
                assert_eq!(actual, PluginKind::Resource);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_register_named() {
        let mut catalogue = LocalCatalogue::new();
        catalogue.register_named(PluginManifest::resource("cdn", "./modules/cdn"));
        assert!(catalogue.contains(&PluginRef::id("cdn")));
        assert_eq!(catalogue.references(), vec!["cdn"]);
    }
}
