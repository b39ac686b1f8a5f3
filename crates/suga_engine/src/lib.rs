//! # suga_engine
//!
//! Resolves an application against a platform and a plugin catalogue into a
//! fully parameterized stack of deployment modules, then hands the stack to
//! a code generator.
//!
//! A pass runs in phases, each failing fast:
//!
//! 1. Declare platform variables
//! 2. Resolve service identities
//! 3. Resolve buckets and databases with their access grants
//! 4. Resolve services with merged environments and runtime plugins
//! 5. Resolve entrypoints and their route origins
//! 6. Resolve property tokens, including lazily referenced infra
//! 7. Compute dependency edges
//! 8. Generate (only for [`Engine::apply`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use suga_engine::{Engine, EngineOptions};
//! use suga_plugins::CatalogueLoader;
//! use suga_spec::SpecReader;
//!
//! let app = SpecReader::read_application("suga.yaml").unwrap();
//! let platform = SpecReader::read_platform("platform.yaml").unwrap();
//! let catalogue = CatalogueLoader::new("plugins").load_all().unwrap();
//!
//! let engine = Engine::new(platform, Arc::new(catalogue))
//!     .with_options(EngineOptions::new().with_output_dir("out"));
//! let path = engine.apply(&app).unwrap();
//! println!("Wrote {}", path.display());
//! ```

pub mod access;
pub mod blueprint;
pub mod codegen;
mod deployment;
pub mod deps;
pub mod engine;
pub mod env;
pub mod error;
pub mod identity;
pub mod infra;
pub mod module;
pub mod runtime;
pub mod token;

pub use access::expand_actions;
pub use blueprint::BlueprintResolver;
pub use codegen::{CodeGenerator, TerraformGenerator};
pub use deployment::SCHEDULES_CAPABILITY;
pub use engine::{Engine, EngineOptions};
pub use error::{EngineError, EngineResult};
pub use infra::InfraTable;
pub use module::{ModuleKind, ResolvedModule, ResolvedStack};
pub use runtime::{GoPlugin, PluginDefinition};
pub use token::{SpecReference, TokenSource};
