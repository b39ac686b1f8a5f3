//! The resolution engine.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use suga_plugins::PluginCatalogue;
use suga_spec::{ApplicationSpec, PlatformSpec};

use crate::blueprint::BlueprintResolver;
use crate::codegen::{CodeGenerator, TerraformGenerator};
use crate::deployment::Deployment;
use crate::error::EngineResult;
use crate::module::ResolvedStack;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineOptions {
    /// Directory the default generator writes stacks into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Stack name; defaults to the application name
    #[serde(default)]
    pub stack_name: Option<String>,
    /// Module input that carries the engine-provided values
    #[serde(default = "default_input_variable")]
    pub input_variable: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("suga.out")
}

fn default_input_variable() -> String {
    "suga".to_string()
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            stack_name: None,
            input_variable: default_input_variable(),
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_stack_name(mut self, stack_name: impl Into<String>) -> Self {
        self.stack_name = Some(stack_name.into());
        self
    }

    pub fn with_input_variable(mut self, input_variable: impl Into<String>) -> Self {
        self.input_variable = input_variable.into();
        self
    }
}

/// Resolves applications against one platform.
///
/// Each call to [`Engine::resolve`] or [`Engine::apply`] is an independent
/// pass; the engine itself holds no per-application state.
pub struct Engine {
    platform: PlatformSpec,
    catalogue: Arc<dyn PluginCatalogue>,
    generator: Option<Box<dyn CodeGenerator>>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(platform: PlatformSpec, catalogue: Arc<dyn PluginCatalogue>) -> Self {
        Self {
            platform,
            catalogue,
            generator: None,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a custom generator instead of Terraform JSON in `output_dir`.
    pub fn with_generator(mut self, generator: Box<dyn CodeGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn platform(&self) -> &PlatformSpec {
        &self.platform
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Resolve every resource without generating anything.
    pub fn resolve(&self, app: &ApplicationSpec) -> EngineResult<ResolvedStack> {
        let fallback;
        let generator: &dyn CodeGenerator = match &self.generator {
            Some(generator) => generator.as_ref(),
            None => {
                fallback = TerraformGenerator::new(&self.options.output_dir);
                &fallback
            }
        };
        self.resolve_with(app, generator)
    }

    /// Resolve the application and generate its deployment artifact.
    pub fn apply(&self, app: &ApplicationSpec) -> EngineResult<PathBuf> {
        let fallback;
        let generator: &dyn CodeGenerator = match &self.generator {
            Some(generator) => generator.as_ref(),
            None => {
                fallback = TerraformGenerator::new(&self.options.output_dir);
                &fallback
            }
        };

        let stack = self.resolve_with(app, generator)?;
        let path = generator.generate(&stack)?;
        info!("Applied {} to platform {}: {}", app.name, self.platform.name, path.display());
        Ok(path)
    }

    fn resolve_with(
        &self,
        app: &ApplicationSpec,
        generator: &dyn CodeGenerator,
    ) -> EngineResult<ResolvedStack> {
        let stack_name = self.options.stack_name.as_deref().unwrap_or(&app.name);
        let resolver = BlueprintResolver::new(&self.platform, self.catalogue.as_ref());

        Deployment::new(
            app,
            resolver,
            generator,
            stack_name,
            &self.options.input_variable,
        )
        .run()
    }
}
