//! Blueprint and plugin resolution against a platform.

use tracing::debug;

use suga_plugins::{PluginCatalogue, PluginError, PluginManifest};
use suga_spec::{PlatformSpec, PluginRef, ResourceBlueprint, ResourceType, SpecError};

use crate::error::{EngineError, EngineResult};

/// Subtype name that selects the category's base blueprint.
pub const DEFAULT_SUBTYPE: &str = "default";

/// Finds blueprints in a platform and the plugins they name.
pub struct BlueprintResolver<'a> {
    platform: &'a PlatformSpec,
    catalogue: &'a dyn PluginCatalogue,
}

impl<'a> BlueprintResolver<'a> {
    pub fn new(platform: &'a PlatformSpec, catalogue: &'a dyn PluginCatalogue) -> Self {
        Self {
            platform,
            catalogue,
        }
    }

    /// Find the blueprint for a resource type and subtype.
    ///
    /// An empty or `default` subtype selects the category's base blueprint
    /// unless the platform declares a subtype with that name.
    pub fn resolve_blueprint(
        &self,
        resource_type: ResourceType,
        subtype: &str,
    ) -> EngineResult<&'a ResourceBlueprint> {
        let category = self.platform.category(resource_type).ok_or_else(|| {
            EngineError::BlueprintNotFound {
                resource_type: resource_type.to_string(),
                subtype: subtype.to_string(),
                available: Vec::new(),
            }
        })?;

        if let Some(blueprint) = category.subtypes.get(subtype) {
            return Ok(blueprint);
        }
        if subtype.is_empty() || subtype == DEFAULT_SUBTYPE {
            return Ok(&category.base);
        }

        Err(EngineError::BlueprintNotFound {
            resource_type: resource_type.to_string(),
            subtype: subtype.to_string(),
            available: category.subtype_names(),
        })
    }

    /// Resolve the resource plugin a blueprint names.
    pub fn resolve_plugin(&self, blueprint: &ResourceBlueprint) -> EngineResult<PluginManifest> {
        let reference = self.qualify(&blueprint.plugin)?;
        debug!("Resolving resource plugin {}", reference);
        self.catalogue
            .get_resource_plugin(&reference)
            .map_err(from_catalogue)
    }

    /// Resolve the identity plugin an identity blueprint names.
    pub fn resolve_identity_plugin(
        &self,
        blueprint: &ResourceBlueprint,
    ) -> EngineResult<PluginManifest> {
        let reference = self.qualify(&blueprint.plugin)?;
        debug!("Resolving identity plugin {}", reference);
        self.catalogue
            .get_identity_plugin(&reference)
            .map_err(from_catalogue)
    }

    /// The canonical form of a blueprint's plugin reference.
    pub fn qualify(&self, reference: &PluginRef) -> EngineResult<PluginRef> {
        self.platform.qualify(reference).map_err(|e| match e {
            SpecError::InvalidLibrary { alias, value } => EngineError::InvalidLibrary { alias, value },
            other => EngineError::InvalidLibrary {
                alias: reference.to_string(),
                value: other.to_string(),
            },
        })
    }

    pub fn platform(&self) -> &'a PlatformSpec {
        self.platform
    }
}

fn from_catalogue(error: PluginError) -> EngineError {
    match error {
        PluginError::NotFound(reference) => EngineError::PluginNotFound { reference },
        PluginError::KindMismatch {
            reference,
            expected,
            actual,
        } => EngineError::PluginKindMismatch {
            reference,
            expected: expected.to_string(),
            actual: actual.to_string(),
        },
        other => EngineError::Catalogue(other),
    }
}
