//! Application spec models.
//!
//! An application is a set of named resource intents grouped by category.
//! Maps are order-preserving so that every pass over the spec visits
//! resources in declaration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Abstract resource categories an application can declare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Service,
    Bucket,
    Database,
    Entrypoint,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Service => "service",
            ResourceType::Bucket => "bucket",
            ResourceType::Database => "database",
            ResourceType::Entrypoint => "entrypoint",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "service" => Some(ResourceType::Service),
            "bucket" => Some(ResourceType::Bucket),
            "database" => Some(ResourceType::Database),
            "entrypoint" => Some(ResourceType::Entrypoint),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            ResourceType::Service,
            ResourceType::Bucket,
            ResourceType::Database,
            ResourceType::Entrypoint,
        ]
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Root application specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Platforms this application is expected to work on
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub services: IndexMap<String, ServiceIntent>,
    #[serde(default)]
    pub buckets: IndexMap<String, BucketIntent>,
    #[serde(default)]
    pub databases: IndexMap<String, DatabaseIntent>,
    #[serde(default)]
    pub entrypoints: IndexMap<String, EntrypointIntent>,
}

impl ApplicationSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            targets: Vec::new(),
            services: IndexMap::new(),
            buckets: IndexMap::new(),
            databases: IndexMap::new(),
            entrypoints: IndexMap::new(),
        }
    }

    pub fn with_service(mut self, name: impl Into<String>, intent: ServiceIntent) -> Self {
        self.services.insert(name.into(), intent);
        self
    }

    pub fn with_bucket(mut self, name: impl Into<String>, intent: BucketIntent) -> Self {
        self.buckets.insert(name.into(), intent);
        self
    }

    pub fn with_database(mut self, name: impl Into<String>, intent: DatabaseIntent) -> Self {
        self.databases.insert(name.into(), intent);
        self
    }

    pub fn with_entrypoint(mut self, name: impl Into<String>, intent: EntrypointIntent) -> Self {
        self.entrypoints.insert(name.into(), intent);
        self
    }

    /// All resource intents, services first, then buckets, databases and
    /// entrypoints, each in declaration order.
    pub fn resource_intents(&self) -> Vec<(&str, ResourceIntent<'_>)> {
        let services = self
            .services
            .iter()
            .map(|(n, i)| (n.as_str(), ResourceIntent::Service(i)));
        let buckets = self
            .buckets
            .iter()
            .map(|(n, i)| (n.as_str(), ResourceIntent::Bucket(i)));
        let databases = self
            .databases
            .iter()
            .map(|(n, i)| (n.as_str(), ResourceIntent::Database(i)));
        let entrypoints = self
            .entrypoints
            .iter()
            .map(|(n, i)| (n.as_str(), ResourceIntent::Entrypoint(i)));

        services
            .chain(buckets)
            .chain(databases)
            .chain(entrypoints)
            .collect()
    }

    /// Look up any resource intent by name.
    pub fn resource_intent(&self, name: &str) -> Option<ResourceIntent<'_>> {
        if let Some(service) = self.services.get(name) {
            return Some(ResourceIntent::Service(service));
        }
        if let Some(bucket) = self.buckets.get(name) {
            return Some(ResourceIntent::Bucket(bucket));
        }
        if let Some(database) = self.databases.get(name) {
            return Some(ResourceIntent::Database(database));
        }
        self.entrypoints.get(name).map(ResourceIntent::Entrypoint)
    }

    /// Total number of declared resources.
    pub fn len(&self) -> usize {
        self.services.len() + self.buckets.len() + self.databases.len() + self.entrypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A borrowed view over one declared resource.
#[derive(Debug, Clone, Copy)]
pub enum ResourceIntent<'a> {
    Service(&'a ServiceIntent),
    Bucket(&'a BucketIntent),
    Database(&'a DatabaseIntent),
    Entrypoint(&'a EntrypointIntent),
}

impl ResourceIntent<'_> {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceIntent::Service(_) => ResourceType::Service,
            ResourceIntent::Bucket(_) => ResourceType::Bucket,
            ResourceIntent::Database(_) => ResourceType::Database,
            ResourceIntent::Entrypoint(_) => ResourceType::Entrypoint,
        }
    }

    /// Blueprint subtype; empty selects the category default.
    pub fn subtype(&self) -> &str {
        match self {
            ResourceIntent::Service(i) => &i.subtype,
            ResourceIntent::Bucket(i) => &i.subtype,
            ResourceIntent::Database(i) => &i.subtype,
            ResourceIntent::Entrypoint(i) => &i.subtype,
        }
    }
}

/// Access grants: consuming service name to requested actions.
pub type AccessMap = IndexMap<String, Vec<String>>;

/// A long running service built from a container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceIntent {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub triggers: IndexMap<String, Trigger>,
    #[serde(default)]
    pub container: Container,
}

impl ServiceIntent {
    pub fn from_image(image_id: impl Into<String>) -> Self {
        Self {
            container: Container::image(image_id),
            ..Default::default()
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = subtype.into();
        self
    }

    pub fn with_trigger(mut self, name: impl Into<String>, trigger: Trigger) -> Self {
        self.triggers.insert(name.into(), trigger);
        self
    }

    /// Triggers that carry a schedule.
    pub fn schedules(&self) -> impl Iterator<Item = (&String, &Trigger)> {
        self.triggers.iter().filter(|(_, t)| t.schedule.is_some())
    }
}

/// A service trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Trigger {
    #[serde(default)]
    pub schedule: Option<Schedule>,
    /// Path the trigger invokes on the service
    #[serde(default)]
    pub path: String,
}

impl Trigger {
    pub fn cron(expression: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            schedule: Some(Schedule {
                cron_expression: expression.into(),
            }),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    #[serde(alias = "cron")]
    pub cron_expression: String,
}

/// Build source for a service container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Container {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerSource>,
}

impl Container {
    pub fn image(id: impl Into<String>) -> Self {
        Self {
            image: Some(ImageSource { id: id.into() }),
            docker: None,
        }
    }
}

/// A prebuilt container image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSource {
    pub id: String,
}

/// A container built from a Dockerfile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DockerSource {
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default)]
    pub args: IndexMap<String, String>,
}

fn default_dockerfile() -> String {
    "Dockerfile".to_string()
}

fn default_context() -> String {
    ".".to_string()
}

/// An object storage bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BucketIntent {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub access: AccessMap,
    /// Local directory whose content is uploaded to the bucket
    #[serde(default)]
    pub content_path: Option<String>,
}

impl BucketIntent {
    pub fn with_access<I, S>(mut self, service: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access
            .insert(service.into(), actions.into_iter().map(Into::into).collect());
        self
    }
}

/// A managed database.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatabaseIntent {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub access: AccessMap,
    /// Env var the connection string is exported under
    #[serde(default)]
    pub env_var_key: Option<String>,
}

impl DatabaseIntent {
    pub fn with_access<I, S>(mut self, service: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access
            .insert(service.into(), actions.into_iter().map(Into::into).collect());
        self
    }
}

/// A public entrypoint routing paths to services or buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntrypointIntent {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub routes: IndexMap<String, Route>,
}

impl EntrypointIntent {
    pub fn with_route(mut self, path: impl Into<String>, target: impl Into<String>) -> Self {
        self.routes.insert(
            path.into(),
            Route {
                name: target.into(),
                base_path: String::new(),
            },
        );
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    /// Name of the target resource
    #[serde(alias = "target")]
    pub name: String,
    #[serde(default)]
    pub base_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_parse() {
        let app: ApplicationSpec = serde_yaml::from_str(
            r#"
name: shop
targets: [acme/aws@1]
services:
  api:
    env:
      LOG_LEVEL: debug
    container:
      docker:
        dockerfile: api.dockerfile
    triggers:
      nightly:
        schedule:
          cron_expression: "0 0 * * *"
        path: /jobs/nightly
buckets:
  images:
    access:
      api: [read, write]
entrypoints:
  public:
    routes:
      /api/:
        name: api
"#,
        )
        .unwrap();

        assert_eq!(app.name, "shop");
        let api = &app.services["api"];
        assert_eq!(api.env["LOG_LEVEL"], "debug");
        assert_eq!(api.container.docker.as_ref().unwrap().context, ".");
        assert_eq!(api.schedules().count(), 1);
        assert_eq!(app.buckets["images"].access["api"], vec!["read", "write"]);
        assert_eq!(app.entrypoints["public"].routes["/api/"].name, "api");
    }

    #[test]
    fn test_resource_intents_order() {
        let app = ApplicationSpec::new("demo")
            .with_entrypoint("web", EntrypointIntent::default().with_route("/", "b"))
            .with_service("b", ServiceIntent::from_image("b:1"))
            .with_service("a", ServiceIntent::from_image("a:1"))
            .with_bucket("files", BucketIntent::default());

        let names: Vec<_> = app.resource_intents().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["b", "a", "files", "web"]);
        assert_eq!(app.len(), 4);
    }

    #[test]
    fn test_resource_intent_lookup() {
        let app = ApplicationSpec::new("demo")
            .with_service("svc", ServiceIntent::from_image("svc:1").with_subtype("heavy"))
            .with_database("db", DatabaseIntent::default());

        let svc = app.resource_intent("svc").unwrap();
        assert_eq!(svc.resource_type(), ResourceType::Service);
        assert_eq!(svc.subtype(), "heavy");
        assert_eq!(
            app.resource_intent("db").unwrap().resource_type(),
            ResourceType::Database
        );
        assert!(app.resource_intent("missing").is_none());
    }

    #[test]
    fn test_resource_type_roundtrip() {
        for ty in ResourceType::all() {
            assert_eq!(ResourceType::from_str(ty.as_str()), Some(ty));
        }
        assert_eq!(ResourceType::from_str("topic"), None);
    }
}
