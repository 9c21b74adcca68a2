//! Operator confirmation and progress reporting.
//!
//! These traits keep the orchestrator free of terminal I/O: the binary
//! provides prompt and output implementations, tests provide recorders.

use crate::error::{Error, Result};
use crate::report::{HostOutcome, SkipReason};
use crate::types::{Decision, DiffResult, HostRecord};

/// Confirmation callback for user interaction.
pub trait Confirm {
    /// Ask the operator a yes/no question. An empty answer means yes.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Confirmation that is not allowed to happen.
pub struct NoPrompt;

impl Confirm for NoPrompt {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Err(Error::Prompt {
            message: format!("no interactive prompt available for: {prompt}"),
        })
    }
}

/// Receives progress events during a run.
pub trait Reporter {
    /// A host was filtered out before any connection attempt.
    fn on_skip(&mut self, host: &HostRecord, reason: &SkipReason);

    /// Processing of a host is starting.
    fn on_host_start(&mut self, host: &HostRecord);

    /// Diff discovery finished and an action was chosen.
    fn on_decision(&mut self, host: &HostRecord, diff: &DiffResult, decision: &Decision);

    /// The mutating action succeeded and the restart is next.
    fn on_applied(&mut self, host: &HostRecord, decision: &Decision);

    /// Processing of a host finished.
    fn on_outcome(&mut self, host: &HostRecord, outcome: &HostOutcome);
}

/// No-op reporter.
pub struct NoReport;

impl Reporter for NoReport {
    fn on_skip(&mut self, _host: &HostRecord, _reason: &SkipReason) {}
    fn on_host_start(&mut self, _host: &HostRecord) {}
    fn on_decision(&mut self, _host: &HostRecord, _diff: &DiffResult, _decision: &Decision) {}
    fn on_applied(&mut self, _host: &HostRecord, _decision: &Decision) {}
    fn on_outcome(&mut self, _host: &HostRecord, _outcome: &HostOutcome) {}
}
