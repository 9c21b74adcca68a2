//! OpsWorks records as returned by the `describe-*` calls.

use serde::Deserialize;

/// A layer within a stack.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Layer {
    /// Layer identifier
    pub layer_id: String,
    /// Short name used on the command line (e.g. "rails-app")
    pub shortname: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// An instance within a layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    /// Instance identifier
    #[serde(default)]
    pub instance_id: Option<String>,
    /// Hostname within the stack
    pub hostname: String,
    /// Public address, absent for stopped or private instances
    #[serde(default)]
    pub public_ip: Option<String>,
    /// Lifecycle status (e.g. "online", "stopped")
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeLayers {
    #[serde(default)]
    pub layers: Vec<Layer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeInstances {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

/// How the `aws` CLI should authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Explicit access key pair
    Keys {
        /// Access key id
        access_key: String,
        /// Secret access key
        secret_key: String,
    },
    /// Named profile from the AWS config
    Profile(String),
    /// Whatever the CLI resolves from its environment
    Ambient,
}
