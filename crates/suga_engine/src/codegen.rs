//! Code generation for resolved stacks.
//!
//! The engine never builds provider syntax itself. It asks a
//! [`CodeGenerator`] for opaque references (module outputs, variables, the
//! stack id, merges) while resolving, then hands over the finished
//! [`ResolvedStack`].

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use suga_spec::Variable;

use crate::error::{EngineError, EngineResult};
use crate::module::{ResolvedModule, ResolvedStack};

/// File written into each stack directory.
pub const TERRAFORM_FILE: &str = "main.tf.json";

/// Renders references and writes the deployment artifact.
pub trait CodeGenerator: Send + Sync {
    /// Reference to an output of a module.
    fn output(&self, module: &str, path: &str) -> Value;

    /// Reference to a module output that evaluates to an empty map when absent.
    fn optional_output(&self, module: &str, path: &str) -> Value;

    /// Reference to a stack variable.
    fn variable(&self, name: &str) -> Value;

    /// Reference to the stack's unique id.
    fn stack_id(&self) -> Value;

    /// Merge maps left to right, later keys winning.
    fn merge(&self, parts: &[Value]) -> Value;

    /// Write the stack and return the path of the generated artifact.
    fn generate(&self, stack: &ResolvedStack) -> EngineResult<PathBuf>;
}

/// Generates Terraform JSON configuration.
pub struct TerraformGenerator {
    output_dir: PathBuf,
}

impl TerraformGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Build the configuration document for a stack.
    pub fn render(&self, stack: &ResolvedStack) -> EngineResult<Value> {
        let mut variables = Map::new();
        for (name, variable) in stack.variables.iter().chain(&stack.instance_variables) {
            variables.insert(name.clone(), render_variable(variable));
        }

        let mut modules = Map::new();
        let mut seen = HashSet::new();
        for module in stack.all_modules() {
            if !seen.insert(module.name.as_str()) {
                return Err(EngineError::Generation(format!(
                    "module name {} is used by more than one resource",
                    module.name
                )));
            }
            modules.insert(module.name.clone(), render_module(module));
        }

        let mut document = json!({
            "terraform": {
                "required_providers": {
                    "random": { "source": "hashicorp/random" }
                }
            },
            "provider": { "random": {} },
            "resource": {
                "random_string": {
                    "stack_id": {
                        "length": 8,
                        "upper": false,
                        "lower": true,
                        "numeric": false,
                        "special": false
                    }
                }
            }
        });

        if !variables.is_empty() {
            document["variable"] = Value::Object(variables);
        }
        if !modules.is_empty() {
            document["module"] = Value::Object(modules);
        }
        Ok(document)
    }
}

impl CodeGenerator for TerraformGenerator {
    fn output(&self, module: &str, path: &str) -> Value {
        Value::String(format!("${{module.{}.{}}}", module, path))
    }

    fn optional_output(&self, module: &str, path: &str) -> Value {
        Value::String(format!("${{try(module.{}.{}, {{}})}}", module, path))
    }

    fn variable(&self, name: &str) -> Value {
        Value::String(format!("${{var.{}}}", name))
    }

    fn stack_id(&self) -> Value {
        Value::String("${random_string.stack_id.result}".to_string())
    }

    fn merge(&self, parts: &[Value]) -> Value {
        let args: Vec<String> = parts.iter().map(expression).collect();
        Value::String(format!("${{merge({})}}", args.join(", ")))
    }

    fn generate(&self, stack: &ResolvedStack) -> EngineResult<PathBuf> {
        let document = self.render(stack)?;

        let stack_dir = self.output_dir.join(&stack.name);
        fs::create_dir_all(&stack_dir)?;

        let path = stack_dir.join(TERRAFORM_FILE);
        fs::write(&path, serde_json::to_string_pretty(&document)?)?;

        info!(
            "Generated {} with {} modules",
            path.display(),
            stack.all_modules().count()
        );
        Ok(path)
    }
}

fn render_variable(variable: &Variable) -> Value {
    let mut block = Map::new();
    if let Some(description) = &variable.description {
        block.insert("description".into(), Value::String(description.clone()));
    }
    if let Some(var_type) = &variable.var_type {
        block.insert("type".into(), Value::String(var_type.clone()));
    }
    if let Some(default) = &variable.default {
        block.insert("default".into(), default.clone());
    }
    Value::Object(block)
}

fn render_module(module: &ResolvedModule) -> Value {
    debug!("Rendering {} module {}", module.kind, module.name);

    let mut block = Map::new();
    block.insert("source".into(), Value::String(module.source.clone()));
    for (name, value) in &module.variables {
        block.insert(name.clone(), value.clone());
    }
    if !module.depends_on.is_empty() {
        let depends_on = module
            .depends_on
            .iter()
            .map(|m| Value::String(format!("module.{}", m)))
            .collect();
        block.insert("depends_on".into(), Value::Array(depends_on));
    }
    Value::Object(block)
}

/// A value as a bare expression inside an interpolation.
fn expression(value: &Value) -> String {
    match value {
        Value::String(s) => match s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
            Some(inner) => inner.to_string(),
            None => Value::String(s.clone()).to_string(),
        },
        other => other.to_string(),
    }
}
