//! Plugin manifest definitions.
//!
//! A manifest describes one deployable unit: the module that deploys it,
//! the runtime it ships to services, and a kind-specific payload. Resource
//! plugins declare capabilities and the identity types they need; identity
//! plugins declare the identity type they provide.

use serde::{Deserialize, Serialize};

/// The two plugin flavours a catalogue can hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    Resource,
    Identity,
}

impl PluginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Resource => "resource",
            PluginKind::Identity => "identity",
        }
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific manifest content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PluginPayload {
    Resource {
        /// Optional features the plugin supports, e.g. `schedules`
        #[serde(default)]
        capabilities: Vec<String>,
        /// Identity types a service deployed by this plugin must be given
        #[serde(default)]
        required_identities: Vec<String>,
    },
    Identity {
        /// The identity type this plugin satisfies
        identity_type: String,
    },
}

/// Module reference consumed by the code generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentModule {
    /// Terraform module source
    pub terraform: String,
}

/// Runtime module shipped with services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeModule {
    pub go_module: String,
}

/// Plugin manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginManifest {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub deployment: DeploymentModule,
    #[serde(default)]
    pub runtime: Option<RuntimeModule>,
    /// Outputs other resources may reference through `${infra.<name>.<output>}`
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(flatten)]
    pub payload: PluginPayload,
}

fn default_version() -> String {
    "0.0.1".to_string()
}

impl PluginManifest {
    /// A resource plugin with no capabilities or identity requirements.
    pub fn resource(name: impl Into<String>, terraform: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            description: None,
            deployment: DeploymentModule {
                terraform: terraform.into(),
            },
            runtime: None,
            outputs: Vec::new(),
            payload: PluginPayload::Resource {
                capabilities: Vec::new(),
                required_identities: Vec::new(),
            },
        }
    }

    /// An identity plugin providing `identity_type`.
    pub fn identity(
        name: impl Into<String>,
        terraform: impl Into<String>,
        identity_type: impl Into<String>,
    ) -> Self {
        Self {
            payload: PluginPayload::Identity {
                identity_type: identity_type.into(),
            },
            ..Self::resource(name, terraform)
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        if let PluginPayload::Resource { capabilities, .. } = &mut self.payload {
            capabilities.push(capability.into());
        }
        self
    }

    pub fn with_required_identity(mut self, identity_type: impl Into<String>) -> Self {
        if let PluginPayload::Resource {
            required_identities,
            ..
        } = &mut self.payload
        {
            required_identities.push(identity_type.into());
        }
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.outputs.push(output.into());
        self
    }

    pub fn with_runtime(mut self, go_module: impl Into<String>) -> Self {
        self.runtime = Some(RuntimeModule {
            go_module: go_module.into(),
        });
        self
    }

    pub fn kind(&self) -> PluginKind {
        match self.payload {
            PluginPayload::Resource { .. } => PluginKind::Resource,
            PluginPayload::Identity { .. } => PluginKind::Identity,
        }
    }

    pub fn capabilities(&self) -> &[String] {
        match &self.payload {
            PluginPayload::Resource { capabilities, .. } => capabilities,
            PluginPayload::Identity { .. } => &[],
        }
    }

    pub fn required_identities(&self) -> &[String] {
        match &self.payload {
            PluginPayload::Resource {
                required_identities,
                ..
            } => required_identities,
            PluginPayload::Identity { .. } => &[],
        }
    }

    pub fn identity_type(&self) -> Option<&str> {
        match &self.payload {
            PluginPayload::Resource { .. } => None,
            PluginPayload::Identity { identity_type } => Some(identity_type),
        }
    }

    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities().iter().any(|c| c == capability)
    }

    pub fn exposes(&self, output: &str) -> bool {
        self.outputs.iter().any(|o| o == output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_manifest() {
        let manifest: PluginManifest = serde_yaml::from_str(
            r#"
name: lambda
type: resource
deployment:
  terraform: ./modules/lambda
runtime:
  go_module: github.com/acme/plugins/lambda@v0.1.0
capabilities: [schedules]
required_identities: ["aws:iam:role"]
"#,
        )
        .unwrap();

        assert_eq!(manifest.kind(), PluginKind::Resource);
        assert_eq!(manifest.version, "0.0.1");
        assert!(manifest.supports("schedules"));
        assert!(!manifest.supports("websockets"));
        assert_eq!(manifest.required_identities(), ["aws:iam:role"]);
        assert_eq!(manifest.identity_type(), None);
    }

    #[test]
    fn test_identity_manifest() {
        let manifest: PluginManifest = serde_yaml::from_str(
            r#"
name: iam-role
version: 0.2.0
type: identity
identity_type: "aws:iam:role"
deployment:
  terraform: ./modules/iam-role
"#,
        )
        .unwrap();

        assert_eq!(manifest.kind(), PluginKind::Identity);
        assert_eq!(manifest.identity_type(), Some("aws:iam:role"));
        assert!(manifest.capabilities().is_empty());
    }

    #[test]
    fn test_manifest_without_kind_is_rejected() {
        let result: Result<PluginManifest, _> = serde_yaml::from_str(
            r#"
name: mystery
deployment:
  terraform: ./modules/mystery
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_builders_respect_kind() {
        let identity = PluginManifest::identity("role", "./role", "storage")
            .with_capability("schedules")
            .with_required_identity("other");
        assert!(identity.capabilities().is_empty());
        assert!(identity.required_identities().is_empty());

        let resource = PluginManifest::resource("vpc", "./vpc").with_output("id");
        assert!(resource.exposes("id"));
        assert!(!resource.exposes("arn"));
    }
}
