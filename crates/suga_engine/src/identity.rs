//! Service identities.

use indexmap::IndexMap;
use serde_json::Value;

use suga_plugins::PluginManifest;

use crate::error::{EngineError, EngineResult};

/// Identity type to the generator's reference for the identity module.
pub type IdentityOutputs = IndexMap<String, Value>;

/// Module name for a service's identity created by `plugin`.
pub fn identity_module_name(service: &str, plugin: &str) -> String {
    format!("{}_{}_role", service, plugin)
}

/// Fail unless every identity the service plugin requires was provided.
pub fn check_required_identities(
    service: &str,
    plugin: &PluginManifest,
    provided: &IdentityOutputs,
) -> EngineResult<()> {
    let missing: Vec<String> = plugin
        .required_identities()
        .iter()
        .filter(|required| !provided.contains_key(*required))
        .cloned()
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(EngineError::MissingIdentity {
        service: service.to_string(),
        missing,
        provided: provided.keys().cloned().collect(),
        required_by: plugin.name.clone(),
    })
}
