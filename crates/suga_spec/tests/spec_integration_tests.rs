//! Integration tests for reading and validating specs.

use std::fs;
use tempfile::tempdir;

use suga_spec::{
    PluginRef, ResourceIntent, ResourceType, SpecError, SpecReader, SpecValidator,
};

const APP_YAML: &str = r#"
name: shop
description: A small web shop
targets:
  - acme/aws@0.1.0
services:
  api:
    env:
      LOG_LEVEL: info
    container:
      image:
        id: shop/api:latest
    triggers:
      cleanup:
        schedule:
          cron: "0 3 * * *"
        path: /jobs/cleanup
  worker:
    subtype: batch
    container:
      docker:
        context: ./worker
buckets:
  assets:
    content_path: ./public
    access:
      api: [read]
databases:
  orders:
    env_var_key: ORDERS_URL
    access:
      api: [all]
      worker: [query]
entrypoints:
  web:
    routes:
      /:
        name: assets
      /api/:
        name: api
        base_path: /v1
"#;

const PLATFORM_YAML: &str = r#"
name: aws-lite
libraries:
  aws: acme/aws@0.1.0
variables:
  region:
    type: string
    default: us-east-1
services:
  plugin: aws/lambda
  identities:
    - plugin: aws/iam-role
  properties:
    timeout: 10
    vpc: ${infra.network.vpc_id}
  subtypes:
    batch:
      plugin: aws/fargate
      depends_on:
        - ${infra.network}
buckets:
  plugin: aws/s3-bucket
databases:
  plugin:
    team: acme
    library: aws
    version: 0.1.0
    plugin: rds
entrypoints:
  plugin: aws/cloudfront
infra:
  network:
    plugin: aws/vpc
"#;

/// Read an application from disk and walk its resources in declaration order.
#[test]
fn test_application_full_workflow() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("suga.yaml");
    fs::write(&path, APP_YAML).unwrap();

    let app = SpecReader::read_application(&path).unwrap();
    assert_eq!(app.name, "shop");
    assert_eq!(app.len(), 5);

    let order: Vec<(&str, ResourceType)> = app
        .resource_intents()
        .into_iter()
        .map(|(name, intent)| (name, intent.resource_type()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("api", ResourceType::Service),
            ("worker", ResourceType::Service),
            ("assets", ResourceType::Bucket),
            ("orders", ResourceType::Database),
            ("web", ResourceType::Entrypoint),
        ]
    );

    // Schedules accept the short `cron` key
    let api = &app.services["api"];
    let schedules: Vec<_> = api.schedules().collect();
    assert_eq!(schedules.len(), 1);
    assert_eq!(
        schedules[0].1.schedule.as_ref().unwrap().cron_expression,
        "0 3 * * *"
    );

    // Docker defaults are filled in
    let docker = app.services["worker"].container.docker.as_ref().unwrap();
    assert_eq!(docker.dockerfile, "Dockerfile");
    assert_eq!(docker.context, "./worker");

    match app.resource_intent("worker") {
        Some(ResourceIntent::Service(worker)) => assert_eq!(worker.subtype, "batch"),
        other => panic!("unexpected intent: {:?}", other),
    }

    let result = SpecValidator::validate_application(&app);
    assert!(result.valid, "Validation failed: {:?}", result.errors);
}

/// Read a platform and qualify its plugin references.
#[test]
fn test_platform_full_workflow() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("platform.yaml");
    fs::write(&path, PLATFORM_YAML).unwrap();

    let platform = SpecReader::read_platform(&path).unwrap();
    assert_eq!(platform.name, "aws-lite");
    assert_eq!(platform.variables["region"].var_type.as_deref(), Some("string"));

    let services = platform.category(ResourceType::Service).unwrap();
    assert_eq!(services.subtype_names(), vec!["batch"]);
    assert_eq!(services.base.identities.len(), 1);
    assert_eq!(
        services.base.properties["vpc"],
        serde_json::json!("${infra.network.vpc_id}")
    );

    let qualified = platform.qualify(&services.base.plugin).unwrap();
    assert_eq!(qualified.to_string(), "acme/aws@0.1.0/lambda");

    let databases = platform.category(ResourceType::Database).unwrap();
    assert!(matches!(databases.base.plugin, PluginRef::Library { .. }));
    assert_eq!(databases.base.plugin.plugin_name(), "rds");

    assert!(platform.category(ResourceType::Entrypoint).is_some());
    assert_eq!(platform.infra.keys().collect::<Vec<_>>(), vec!["network"]);
}

/// JSON specs are accepted alongside YAML.
#[test]
fn test_read_json_application() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("suga.json");
    fs::write(
        &path,
        r#"{"name": "tiny", "services": {"svc": {"container": {"image": {"id": "echo:latest"}}}}}"#,
    )
    .unwrap();

    let app = SpecReader::read_application(&path).unwrap();
    assert_eq!(app.name, "tiny");
    assert_eq!(
        app.services["svc"].container.image.as_ref().unwrap().id,
        "echo:latest"
    );
}

/// Missing and malformed files produce distinct errors.
#[test]
fn test_read_errors() {
    let temp = tempdir().unwrap();

    let missing = SpecReader::read_platform(temp.path().join("absent.yaml"));
    assert!(matches!(missing, Err(SpecError::NotFound(_))));

    let broken = temp.path().join("broken.yaml");
    fs::write(&broken, "name: [unclosed").unwrap();
    let result = SpecReader::read_application(&broken);
    assert!(matches!(result, Err(SpecError::InvalidFormat { .. })));
}

/// Duplicate names across categories are reported once per clash.
#[test]
fn test_validate_duplicate_names() {
    let app = SpecReader::application_from_str(
        r#"
name: clash
services:
  data:
    container:
      image:
        id: data:1
buckets:
  data: {}
databases:
  data: {}
"#,
    )
    .unwrap();

    let result = SpecValidator::validate_names(&app);
    assert!(!result.valid);
    assert_eq!(
        result.errors,
        vec![
            "bucket name data is already in use by a service",
            "database name data is already in use by a service",
        ]
    );
}

/// Unknown library aliases are rejected when qualifying.
#[test]
fn test_invalid_library_alias() {
    let platform = SpecReader::platform_from_str(
        r#"
name: broken
libraries:
  aws: not-a-library
"#,
    )
    .unwrap();

    let result = platform.qualify(&PluginRef::id("aws/lambda"));
    assert!(matches!(result, Err(SpecError::InvalidLibrary { .. })));

    // Unknown prefixes pass through unchanged
    let passthrough = platform.qualify(&PluginRef::id("gcp/run")).unwrap();
    assert_eq!(passthrough, PluginRef::id("gcp/run"));
}
