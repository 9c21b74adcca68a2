//! Backend abstraction for OpsWorks API calls.

pub mod aws_cli;

use crate::error::Result;
use crate::types::{Instance, Layer};

/// The two OpsWorks calls needed to resolve a layer.
pub trait Backend: Send + Sync {
    /// `DescribeLayers` for a stack.
    fn describe_layers(&self, stack_id: &str) -> Result<Vec<Layer>>;

    /// `DescribeInstances` for a layer.
    fn describe_instances(&self, layer_id: &str) -> Result<Vec<Instance>>;
}
