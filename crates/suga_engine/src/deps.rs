//! Dependency edges from `depends_on` tokens.

use suga_spec::PlatformSpec;

use crate::error::{EngineError, EngineResult};
use crate::token::{SpecReference, TokenSource};

/// Convert a module's `depends_on` tokens into infra module names.
///
/// Every token must be an `infra` reference to a declared infra resource.
/// The result is deduplicated and keeps declaration order.
pub fn dependency_edges(
    resource: &str,
    depends_on: &[String],
    platform: &PlatformSpec,
) -> EngineResult<Vec<String>> {
    let mut edges: Vec<String> = Vec::with_capacity(depends_on.len());

    for token in depends_on {
        let reference = match SpecReference::parse(token) {
            Some(r) if r.source == TokenSource::Infra => r,
            _ => {
                return Err(EngineError::InvalidDependency {
                    resource: resource.to_string(),
                    token: token.clone(),
                })
            }
        };

        let target = reference.name();
        if !platform.infra.contains_key(target) {
            return Err(EngineError::UnresolvedReference {
                origin: TokenSource::Infra.to_string(),
                name: target.to_string(),
                property: reference.property(),
            });
        }
        if !edges.iter().any(|e| e == target) {
            edges.push(target.to_string());
        }
    }

    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use suga_spec::{PluginRef, ResourceBlueprint};

    fn platform() -> PlatformSpec {
        PlatformSpec::new("test")
            .with_infra("network", ResourceBlueprint::new(PluginRef::id("vpc")))
            .with_infra("cluster", ResourceBlueprint::new(PluginRef::id("ecs")))
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_edges_keep_order_without_duplicates() {
        let edges = dependency_edges(
            "api",
            &tokens(&["${infra.cluster}", "${infra.network.vpc_id}", "${infra.cluster}"]),
            &platform(),
        )
        .unwrap();
        assert_eq!(edges, vec!["cluster", "network"]);
    }

    #[test]
    fn test_non_infra_dependency() {
        for token in ["${var.x}", "network", "${self.network}"] {
            let err = dependency_edges("api", &tokens(&[token]), &platform()).unwrap_err();
            match err {
                EngineError::InvalidDependency { resource, token: t } => {
                    assert_eq!(resource, "api");
                    assert_eq!(t, token);
                }
                other => panic!("unexpected error: {}", other),
            }
        }
    }

    #[test]
    fn test_undeclared_infra_dependency() {
        let err = dependency_edges("api", &tokens(&["${infra.queue}"]), &platform()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnresolvedReference { ref name, .. } if name == "queue"
        ));
    }
}
