//! Application spec validation.
//!
//! These checks mirror what the schema loader guarantees before a spec
//! reaches the engine: unique names across categories and references that
//! point at declared resources.

use std::collections::HashMap;

use crate::models::{ApplicationSpec, ResourceType};

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validator for application specs.
pub struct SpecValidator;

impl SpecValidator {
    /// Run every application check.
    pub fn validate_application(app: &ApplicationSpec) -> ValidationResult {
        let mut result = ValidationResult::new();

        if app.name.trim().is_empty() {
            result.add_error("Application name cannot be empty");
        }
        if app.is_empty() {
            result.add_warning(format!("Application '{}' declares no resources", app.name));
        }

        result.merge(Self::validate_names(app));
        result.merge(Self::validate_references(app));
        result
    }

    /// Resource names must be unique across all categories.
    pub fn validate_names(app: &ApplicationSpec) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut seen: HashMap<&str, ResourceType> = HashMap::new();

        let categories = [
            (ResourceType::Service, app.services.keys().collect::<Vec<_>>()),
            (ResourceType::Bucket, app.buckets.keys().collect()),
            (ResourceType::Database, app.databases.keys().collect()),
            (ResourceType::Entrypoint, app.entrypoints.keys().collect()),
        ];

        for (resource_type, names) in categories {
            for name in names {
                if let Some(existing) = seen.get(name.as_str()) {
                    result.add_error(format!(
                        "{} name {} is already in use by a {}",
                        resource_type, name, existing
                    ));
                    continue;
                }
                seen.insert(name.as_str(), resource_type);
            }
        }

        result
    }

    /// Access grants and routes must point at declared resources.
    pub fn validate_references(app: &ApplicationSpec) -> ValidationResult {
        let mut result = ValidationResult::new();

        let grants = app
            .buckets
            .iter()
            .map(|(name, b)| (name, &b.access))
            .chain(app.databases.iter().map(|(name, d)| (name, &d.access)));

        for (resource, access) in grants {
            for service in access.keys() {
                if !app.services.contains_key(service) {
                    result.add_error(format!(
                        "{} grants access to unknown service {}",
                        resource, service
                    ));
                }
            }
        }

        for (entrypoint, intent) in &app.entrypoints {
            for (path, route) in &intent.routes {
                match app.resource_intent(&route.name).map(|i| i.resource_type()) {
                    Some(ResourceType::Service) | Some(ResourceType::Bucket) => {}
                    Some(other) => result.add_error(format!(
                        "route {} of entrypoint {} targets {} which is a {}, expected a service or bucket",
                        path, entrypoint, route.name, other
                    )),
                    None => result.add_error(format!(
                        "route {} of entrypoint {} targets unknown resource {}",
                        path, entrypoint, route.name
                    )),
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BucketIntent, EntrypointIntent, ServiceIntent};

    #[test]
    fn test_duplicate_names() {
        let app = ApplicationSpec::new("demo")
            .with_service("files", ServiceIntent::from_image("files:1"))
            .with_bucket("files", BucketIntent::default());

        let result = SpecValidator::validate_names(&app);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec!["bucket name files is already in use by a service"]
        );
    }

    #[test]
    fn test_unknown_references() {
        let app = ApplicationSpec::new("demo")
            .with_bucket("files", BucketIntent::default().with_access("ghost", ["read"]))
            .with_entrypoint("web", EntrypointIntent::default().with_route("/", "nowhere"));

        let result = SpecValidator::validate_references(&app);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_valid_application() {
        let app = ApplicationSpec::new("demo")
            .with_service("api", ServiceIntent::from_image("api:1"))
            .with_bucket("files", BucketIntent::default().with_access("api", ["all"]))
            .with_entrypoint("web", EntrypointIntent::default().with_route("/", "api"));

        let result = SpecValidator::validate_application(&app);
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }
}
