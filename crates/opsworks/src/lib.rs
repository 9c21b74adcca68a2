//! # opsworks
//!
//! Resolve an AWS OpsWorks layer to the instances running in it.
//!
//! Lookups go through the `aws` CLI, so any credential source it supports
//! works: explicit keys, a named profile, or the ambient environment.
//!
//! ## Example
//!
//! ```no_run
//! use opsworks::{Client, Credentials};
//!
//! let client = Client::new("us-east-1", Credentials::Profile("ops".into()))
//!     .expect("aws CLI not available");
//! for instance in client.instances_in_layer("stack-id", "rails-app").unwrap() {
//!     println!("{} {}", instance.hostname, instance.status);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Credentials, Instance, Layer};

use backend::{Backend, aws_cli::AwsCliBackend};

/// High-level client for OpsWorks lookups.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client backed by the `aws` CLI.
    ///
    /// Returns an error if the aws CLI is not installed.
    pub fn new(region: &str, credentials: Credentials) -> Result<Self> {
        let backend = AwsCliBackend::new(region, credentials)?;
        Ok(Self {
            backend: Box::new(backend),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Find a layer in a stack by its short name.
    pub fn find_layer(&self, stack_id: &str, shortname: &str) -> Result<Layer> {
        log::info!("Looking up attributes for layer {shortname} on stack {stack_id}");
        self.backend
            .describe_layers(stack_id)?
            .into_iter()
            .find(|l| l.shortname == shortname)
            .ok_or_else(|| Error::LayerNotFound {
                stack_id: stack_id.to_string(),
                layer: shortname.to_string(),
            })
    }

    /// List every instance of a layer, in the order OpsWorks returns them.
    pub fn instances_in_layer(&self, stack_id: &str, shortname: &str) -> Result<Vec<Instance>> {
        let layer = self.find_layer(stack_id, shortname)?;
        log::info!("Loading {} ({}) instances", layer.shortname, layer.layer_id);
        self.backend.describe_instances(&layer.layer_id)
    }
}
