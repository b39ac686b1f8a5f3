//! CLI command definitions.
//!
//! Each subcommand maps to one step of turning an application spec into a
//! deployable stack.

use clap::{Parser, Subcommand};

pub mod build;
pub mod plugins;
pub mod validate;

/// suga - resolve applications against platforms
#[derive(Parser)]
#[command(name = "suga")]
#[command(version, about = "suga - resolve applications against platforms")]
#[command(long_about = r#"
suga resolves an application spec against a platform spec and a plugin
catalogue, then writes the resulting stack as Terraform JSON.

COMMANDS:
  build     → Resolve the application and generate the stack
  validate  → Check an application spec without resolving it
  plugins   → List the plugins found in a catalogue directory

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid input
  3 - Validation failure
  4 - Resolution error
  5 - Generation error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an application and generate its stack
    Build(build::BuildArgs),

    /// Validate an application spec
    Validate(validate::ValidateArgs),

    /// List plugins in a catalogue directory
    Plugins(plugins::PluginsArgs),
}
