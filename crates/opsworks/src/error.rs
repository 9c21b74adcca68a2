//! Error types for OpsWorks lookups.

use thiserror::Error;

/// Errors that can occur while resolving a layer to instances.
#[derive(Debug, Error)]
pub enum Error {
    /// The `aws` executable is not on `PATH`
    #[error("aws CLI not found. Install it from https://aws.amazon.com/cli/")]
    AwsCliNotFound,

    /// No layer with the requested short name exists in the stack
    #[error("unable to find layer {layer} in stack {stack_id}")]
    LayerNotFound {
        /// Stack that was searched
        stack_id: String,
        /// Requested layer short name
        layer: String,
    },

    /// An `aws` invocation failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for OpsWorks lookups.
pub type Result<T> = std::result::Result<T, Error>;
