//! Build command - Resolve an application and generate its stack.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use suga_engine::{Engine, EngineOptions};
use suga_plugins::CatalogueLoader;
use suga_spec::{SpecReader, SpecValidator};

#[derive(Args)]
pub struct BuildArgs {
    /// Application spec file
    #[arg(short, long, env = "SUGA_APP", default_value = "suga.yaml")]
    pub app: PathBuf,

    /// Platform spec file
    #[arg(short, long, env = "SUGA_PLATFORM")]
    pub platform: PathBuf,

    /// Plugin catalogue directory
    #[arg(long, env = "SUGA_PLUGINS", default_value = "plugins")]
    pub plugins: PathBuf,

    /// Output directory for generated stacks
    #[arg(short, long, env = "SUGA_OUT", default_value = "suga.out")]
    pub out: PathBuf,

    /// Stack name (defaults to the application name)
    #[arg(long)]
    pub stack_name: Option<String>,
}

pub fn execute(args: BuildArgs) -> Result<()> {
    info!(
        "Building {} for platform {}",
        args.app.display(),
        args.platform.display()
    );

    let app = SpecReader::read_application(&args.app)?;
    let result = SpecValidator::validate_application(&app);
    for warning in &result.warnings {
        warn!("{}", warning);
    }
    if !result.valid {
        anyhow::bail!(
            "Application spec validation failed:\n  - {}",
            result.errors.join("\n  - ")
        );
    }

    let platform = SpecReader::read_platform(&args.platform)?;
    let catalogue = CatalogueLoader::new(&args.plugins).load_all()?;
    info!(
        "Loaded {} plugins from {}",
        catalogue.len(),
        args.plugins.display()
    );

    let mut options = EngineOptions::new().with_output_dir(&args.out);
    if let Some(stack_name) = args.stack_name {
        options = options.with_stack_name(stack_name);
    }

    let engine = Engine::new(platform, Arc::new(catalogue)).with_options(options);
    let path = engine
        .apply(&app)
        .with_context(|| format!("Failed to build {}", app.name))?;

    println!("✅ Stack written to {}", path.display());
    Ok(())
}
