//! suga CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid input (missing file, unreadable spec)
//! - 3: Validation failure
//! - 4: Resolution error
//! - 5: Generation error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use suga_engine::EngineError;
use suga_plugins::PluginError;
use suga_spec::SpecError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_INPUT: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const RESOLUTION_ERROR: u8 = 4;
    pub const GENERATION_ERROR: u8 = 5;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "suga=debug" } else { "suga=info" };
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive(level.parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Build(args) => commands::build::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Plugins(args) => commands::plugins::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(engine) = e.downcast_ref::<EngineError>() {
        return match engine.kind() {
            EngineError::Generation(_) | EngineError::Io(_) | EngineError::Json(_) => {
                ExitCodes::GENERATION_ERROR
            }
            _ => ExitCodes::RESOLUTION_ERROR,
        };
    }
    if e.downcast_ref::<SpecError>().is_some() || e.downcast_ref::<PluginError>().is_some() {
        return ExitCodes::INVALID_INPUT;
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("validation") {
        ExitCodes::VALIDATION_FAILURE
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
