//! Error types for hotfix operations.
//!
//! Errors are categorized so the orchestrator can decide whether a failure
//! is confined to one host or aborts the whole run. Each variant carries the
//! host, tag, or captured stderr needed to explain what went wrong.

use crate::types::ExitStatus;
use thiserror::Error;

/// Categories of hotfix errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Required settings missing or invalid
    Configuration,
    /// Could not open a session to the host
    Connection,
    /// Target tag unknown or current tag undeterminable
    Tag,
    /// A remote command or the patch itself failed
    Command,
    /// The application restart failed after the codebase changed
    Restart,
    /// Operator interaction failed
    Prompt,
}

impl ErrorCategory {
    /// Whether this category aborts the whole run instead of a single host.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Invalid configuration",
            Self::Connection => "Connection failed",
            Self::Tag => "Tag problem",
            Self::Command => "Remote command failed",
            Self::Restart => "Restart failed",
            Self::Prompt => "Confirmation failed",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => "Check the required options and try again",
            Self::Connection => "Verify the host address, SSH user and identity file",
            Self::Tag => "Make sure the tag was pushed and the remote checkout is on a tag",
            Self::Command => {
                "Patch failed, try resetting the codebase (--reset) or rolling back (--rollback)"
            }
            Self::Restart => {
                "The codebase changed but the application may still run the old code, restart it manually"
            }
            Self::Prompt => "Run from an interactive terminal or pass --yes",
        }
    }
}

/// Errors that can occur while patching hosts.
#[derive(Debug, Error)]
pub enum Error {
    /// Required settings missing or invalid
    #[error("invalid configuration: {}", problems.join("; "))]
    Configuration {
        /// Every problem found during validation
        problems: Vec<String>,
    },

    /// Could not establish a session to a host
    #[error("cannot connect to {host}: {message}")]
    Connection {
        /// Hostname of the unreachable host
        host: String,
        /// Transport-level details
        message: String,
    },

    /// Target tag is not present in the remote tag list
    #[error("can't find tag {tag} in tag list on {host}")]
    UnknownTag {
        /// Hostname the tag list came from
        host: String,
        /// The requested target tag
        tag: String,
    },

    /// Current remote tag could not be determined
    #[error("can't identify current project tag on {host}")]
    MissingTag {
        /// Hostname whose tag is unknown
        host: String,
    },

    /// Current remote tag is not a plain ref name
    #[error("current tag {tag:?} on {host} contains characters that are not allowed")]
    InvalidTag {
        /// Hostname the tag came from
        host: String,
        /// The tag reported by `git describe`
        tag: String,
    },

    /// A remote command did not exit successfully
    #[error("command failed on {host} ({status}): {stderr}")]
    CommandFailed {
        /// Hostname the command ran on
        host: String,
        /// The composed command line
        command: String,
        /// How the remote command terminated
        status: ExitStatus,
        /// Captured standard error
        stderr: String,
    },

    /// Resetting or applying the diff failed
    #[error("patch {from}..{to} failed on {host}: {stderr}")]
    PatchFailed {
        /// Hostname being patched
        host: String,
        /// Tag the host was on
        from: String,
        /// Tag being applied
        to: String,
        /// Captured standard error of the failed step
        stderr: String,
    },

    /// The restart command failed after a successful patch or rollback
    #[error("restart failed on {host}: {stderr}")]
    RestartFailed {
        /// Hostname being restarted
        host: String,
        /// Captured standard error
        stderr: String,
    },

    /// The confirmation prompt could not be shown or read
    #[error("confirmation failed: {message}")]
    Prompt {
        /// Details from the prompt backend
        message: String,
    },
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration { .. } => ErrorCategory::Configuration,
            Error::Connection { .. } => ErrorCategory::Connection,
            Error::UnknownTag { .. } | Error::MissingTag { .. } | Error::InvalidTag { .. } => {
                ErrorCategory::Tag
            }
            Error::CommandFailed { .. } | Error::PatchFailed { .. } => ErrorCategory::Command,
            Error::RestartFailed { .. } => ErrorCategory::Restart,
            Error::Prompt { .. } => ErrorCategory::Prompt,
        }
    }

    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        self.category().is_fatal()
    }

    /// Captured stderr, if this error carries any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { stderr, .. }
            | Error::PatchFailed { stderr, .. }
            | Error::RestartFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Result type for hotfix operations.
pub type Result<T> = std::result::Result<T, Error>;
