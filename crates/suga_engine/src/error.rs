//! Error types for the engine.

use thiserror::Error;

use suga_plugins::PluginError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while resolving or generating a stack.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No {resource_type} blueprint for subtype '{subtype}', available subtypes: {available:?}")]
    BlueprintNotFound {
        resource_type: String,
        subtype: String,
        available: Vec<String>,
    },

    #[error("Plugin not found: {reference}")]
    PluginNotFound { reference: String },

    #[error("Plugin {reference} is a {actual} plugin, expected a {expected} plugin")]
    PluginKindMismatch {
        reference: String,
        expected: String,
        actual: String,
    },

    #[error("Service {service} is missing identities {missing:?} required by plugin {required_by}, provided identities were {provided:?}")]
    MissingIdentity {
        service: String,
        missing: Vec<String>,
        provided: Vec<String>,
        required_by: String,
    },

    #[error("Could not give access to {resource}: service {service} not found")]
    AccessGrantToUnknownService { resource: String, service: String },

    #[error(
        "Unresolved {origin} reference: {name}{}",
        .property.as_ref().map(|p| format!(".{}", p)).unwrap_or_default()
    )]
    UnresolvedReference {
        origin: String,
        name: String,
        property: Option<String>,
    },

    #[error("Invalid dependency {token} on {resource}: dependencies must reference infra resources")]
    InvalidDependency { resource: String, token: String },

    #[error("Route {route} of entrypoint {entrypoint} targets a {target_type}, expected a service or bucket")]
    InvalidRouteTarget {
        entrypoint: String,
        route: String,
        target_type: String,
    },

    #[error("Route {route} of entrypoint {entrypoint} targets unknown resource {target}")]
    RouteTargetNotFound {
        entrypoint: String,
        route: String,
        target: String,
    },

    #[error("Invalid {category} action '{action}' on {resource}")]
    InvalidAction {
        resource: String,
        action: String,
        category: String,
    },

    #[error("Service {service} uses {capability} but plugin {plugin} does not support it")]
    UnsupportedCapability {
        service: String,
        plugin: String,
        capability: String,
    },

    #[error("Service plugin {plugin} for {service} has no runtime configuration")]
    MissingRuntime { service: String, plugin: String },

    #[error("Module name {name} is already in use in this stack")]
    DuplicateModule { name: String },

    #[error("Variable {variable} declared for {module} is already declared in this stack")]
    DuplicateVariable { variable: String, module: String },

    #[error("Invalid library reference for {alias}: {value}")]
    InvalidLibrary { alias: String, value: String },

    #[error("Catalogue error: {0}")]
    Catalogue(#[from] PluginError),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to resolve {resource}: {source}")]
    Resource {
        resource: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Attach the name of the resource being resolved.
    pub fn in_resource(self, resource: impl Into<String>) -> Self {
        EngineError::Resource {
            resource: resource.into(),
            source: Box::new(self),
        }
    }

    /// The underlying error, ignoring resource context.
    pub fn kind(&self) -> &EngineError {
        match self {
            EngineError::Resource { source, .. } => source.kind(),
            other => other,
        }
    }
}
