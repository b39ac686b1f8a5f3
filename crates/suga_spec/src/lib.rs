//! # suga_spec
//!
//! Application and platform specifications for suga.
//!
//! An application spec names abstract resources (services, buckets,
//! databases, entrypoints). A platform spec maps each resource category and
//! subtype to a blueprint describing the plugin that deploys it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use suga_spec::{SpecReader, SpecValidator};
//!
//! let app = SpecReader::read_application("suga.yaml").unwrap();
//! let platform = SpecReader::read_platform("platform.yaml").unwrap();
//!
//! let result = SpecValidator::validate_application(&app);
//! if !result.valid {
//!     for error in &result.errors {
//!         eprintln!("Error: {}", error);
//!     }
//! }
//! # let _ = platform;
//! ```

pub mod error;
pub mod models;
pub mod platform;
pub mod reader;
pub mod validator;

pub use error::{SpecError, SpecResult};
pub use models::*;
pub use platform::{CategorySpec, Library, PlatformSpec, PluginRef, ResourceBlueprint, Variable};
pub use reader::SpecReader;
pub use validator::{SpecValidator, ValidationResult};
