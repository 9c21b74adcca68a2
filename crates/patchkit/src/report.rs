//! Per-host outcomes and the run summary.

use crate::error::Error;
use std::fmt;

/// Why a host was not processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Host status is not `online`
    Offline {
        /// Status reported by the fleet
        status: String,
    },
    /// Host is not in the explicit instance list
    NotSelected,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline { status } => write!(f, "host is {status}"),
            Self::NotSelected => write!(f, "not in instance list"),
        }
    }
}

/// Step of the per-host sequence where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening the session
    Connect,
    /// Tag lookup and commit log
    Discover,
    /// Operator prompt
    Confirm,
    /// Reset or diff-apply
    Apply,
    /// Restart command
    Restart,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Discover => "discover",
            Self::Confirm => "confirm",
            Self::Apply => "apply",
            Self::Restart => "restart",
        };
        f.write_str(name)
    }
}

/// Result of processing one host.
#[derive(Debug)]
pub enum HostOutcome {
    /// No commits between the current and target tag
    UpToDate {
        /// Tag the host is on
        current_tag: String,
    },
    /// The operator refused the action
    Declined,
    /// Diff applied and application restarted
    Patched {
        /// Tag the host was on
        from: String,
        /// Tag applied
        to: String,
        /// Number of commits applied
        commits: usize,
    },
    /// Working tree reset and application restarted
    RolledBack {
        /// Tag the host was reset to
        tag: String,
    },
    /// Something went wrong; later hosts are still processed
    Failed {
        /// Step that failed
        stage: Stage,
        /// The error
        error: Error,
    },
}

impl HostOutcome {
    /// Whether the remote codebase changed during processing.
    ///
    /// A restart failure still means the patch or rollback went through.
    pub fn changed_codebase(&self) -> bool {
        match self {
            Self::Patched { .. } | Self::RolledBack { .. } => true,
            Self::Failed { stage, .. } => *stage == Stage::Restart,
            _ => false,
        }
    }
}

/// A host that failed, kept for the final report.
#[derive(Debug)]
pub struct HostFailure {
    /// Host that failed
    pub hostname: String,
    /// Step that failed
    pub stage: Stage,
    /// The error
    pub error: Error,
}

/// Summary of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Hosts patched and restarted
    pub patched: usize,
    /// Hosts rolled back and restarted
    pub rolled_back: usize,
    /// Hosts with nothing to apply
    pub up_to_date: usize,
    /// Hosts the operator refused
    pub declined: usize,
    /// Hosts filtered out before connecting
    pub skipped: usize,
    /// Hosts that failed, in processing order
    pub failures: Vec<HostFailure>,
}

impl RunSummary {
    /// Hosts a session was attempted for.
    pub fn attempted(&self) -> usize {
        self.patched + self.rolled_back + self.up_to_date + self.declined + self.failures.len()
    }

    /// Whether no host failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Count a filtered-out host.
    pub fn add_skip(&mut self) {
        self.skipped += 1;
    }

    /// Count a processed host.
    pub fn add_outcome(&mut self, hostname: &str, outcome: HostOutcome) {
        match outcome {
            HostOutcome::UpToDate { .. } => self.up_to_date += 1,
            HostOutcome::Declined => self.declined += 1,
            HostOutcome::Patched { .. } => self.patched += 1,
            HostOutcome::RolledBack { .. } => self.rolled_back += 1,
            HostOutcome::Failed { stage, error } => self.failures.push(HostFailure {
                hostname: hostname.to_string(),
                stage,
                error,
            }),
        }
    }
}
