//! Environment propagation from resources into services.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::codegen::CodeGenerator;

/// Env contributions collected per service, in arrival order.
#[derive(Debug, Default)]
pub struct EnvAccumulator {
    exports: IndexMap<String, Vec<Value>>,
}

impl EnvAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an env map (literal or generator reference) for a service.
    pub fn push(&mut self, service: impl Into<String>, env: Value) {
        self.exports.entry(service.into()).or_default().push(env);
    }

    pub fn exports(&self, service: &str) -> &[Value] {
        self.exports.get(service).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Merge a service's exports with its own env, own env last.
    pub fn merged(
        &self,
        service: &str,
        own: &IndexMap<String, String>,
        generator: &dyn CodeGenerator,
    ) -> Value {
        let own = Value::Object(
            own.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        );
        let mut parts = self.exports(service).to_vec();
        parts.push(own);
        merge_env(&parts, generator)
    }
}

/// Merge env maps left to right with later keys winning.
///
/// Literal maps are merged here. As soon as one part is a generator
/// reference the whole merge is deferred to the generator.
pub fn merge_env(parts: &[Value], generator: &dyn CodeGenerator) -> Value {
    if !parts.iter().all(Value::is_object) {
        return generator.merge(parts);
    }

    let mut merged = Map::new();
    for part in parts {
        if let Value::Object(map) = part {
            for (key, value) in map {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::TerraformGenerator;
    use serde_json::json;

    #[test]
    fn test_own_env_wins() {
        let generator = TerraformGenerator::new("out");
        let merged = merge_env(
            &[json!({"X": "0", "Y": "2"}), json!({"X": "1"})],
            &generator,
        );
        assert_eq!(merged, json!({"X": "1", "Y": "2"}));
    }

    #[test]
    fn test_later_exports_override_earlier() {
        let generator = TerraformGenerator::new("out");
        let mut env = EnvAccumulator::new();
        env.push("api", json!({"DB": "first", "A": "a"}));
        env.push("api", json!({"DB": "second"}));

        let own = IndexMap::new();
        assert_eq!(
            env.merged("api", &own, &generator),
            json!({"DB": "second", "A": "a"})
        );
    }

    #[test]
    fn test_references_defer_to_generator() {
        let generator = TerraformGenerator::new("out");
        let mut env = EnvAccumulator::new();
        env.push(
            "api",
            generator.optional_output("files", "suga.exports.services.api.env"),
        );

        let mut own = IndexMap::new();
        own.insert("X".to_string(), "1".to_string());

        assert_eq!(
            env.merged("api", &own, &generator),
            json!(r#"${merge(try(module.files.suga.exports.services.api.env, {}), {"X":"1"})}"#)
        );
    }

    #[test]
    fn test_service_without_exports() {
        let generator = TerraformGenerator::new("out");
        let env = EnvAccumulator::new();
        let mut own = IndexMap::new();
        own.insert("LOG_LEVEL".to_string(), "debug".to_string());

        assert!(env.exports("worker").is_empty());
        assert_eq!(
            env.merged("worker", &own, &generator),
            json!({"LOG_LEVEL": "debug"})
        );
    }
}
