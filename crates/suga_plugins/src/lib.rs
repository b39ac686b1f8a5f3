//! # suga_plugins
//!
//! Plugin manifests and the catalogues that resolve plugin references.
//!
//! ## Example
//!
//! ```rust,no_run
//! use suga_plugins::{CatalogueLoader, PluginCatalogue};
//! use suga_spec::PluginRef;
//!
//! let catalogue = CatalogueLoader::new("plugins").load_all().unwrap();
//! let lambda = catalogue
//!     .get_resource_plugin(&PluginRef::id("acme/aws@0.1.0/lambda"))
//!     .unwrap();
//! println!("{} deploys from {}", lambda.name, lambda.deployment.terraform);
//! ```

pub mod catalogue;
pub mod error;
pub mod loader;
pub mod manifest;

pub use catalogue::{LocalCatalogue, PluginCatalogue};
pub use error::{PluginError, PluginResult};
pub use loader::CatalogueLoader;
pub use manifest::{DeploymentModule, PluginKind, PluginManifest, PluginPayload, RuntimeModule};
