//! Host iteration with per-host failure isolation.

use crate::backend::Connector;
use crate::confirm::{Confirm, Reporter};
use crate::error::{Error, Result};
use crate::report::{HostOutcome, RunSummary, SkipReason, Stage};
use crate::session::{self, PatchSession};
use crate::types::{Decision, HostRecord, PatchOptions};

/// Why a host will not get a session, or `None` if it will.
pub fn skip_reason(host: &HostRecord, options: &PatchOptions) -> Option<SkipReason> {
    if !host.is_online() {
        return Some(SkipReason::Offline {
            status: host.status.clone(),
        });
    }
    if !options.selects(&host.hostname) {
        return Some(SkipReason::NotSelected);
    }
    None
}

/// Drives one patch session per eligible host, strictly in order.
pub struct Orchestrator<'a> {
    connector: &'a dyn Connector,
    confirm: &'a mut dyn Confirm,
    reporter: &'a mut dyn Reporter,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator from its collaborators.
    pub fn new(
        connector: &'a dyn Connector,
        confirm: &'a mut dyn Confirm,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        Self {
            connector,
            confirm,
            reporter,
        }
    }

    /// Process every host.
    ///
    /// Only configuration errors are returned; any other failure is recorded
    /// for its host and the next host is processed.
    pub fn run(&mut self, hosts: &[HostRecord], options: &PatchOptions) -> Result<RunSummary> {
        options.validate()?;

        let mut summary = RunSummary::default();
        for host in hosts {
            if let Some(reason) = skip_reason(host, options) {
                log::debug!("Skipping {}: {}", host.hostname, reason);
                self.reporter.on_skip(host, &reason);
                summary.add_skip();
                continue;
            }

            self.reporter.on_host_start(host);
            let outcome = self.process(host, options)?;
            self.reporter.on_outcome(host, &outcome);
            summary.add_outcome(&host.hostname, outcome);
        }

        Ok(summary)
    }

    fn process(&mut self, host: &HostRecord, options: &PatchOptions) -> Result<HostOutcome> {
        log::info!("Connecting to remote host {}", host.hostname);
        let mut session = match PatchSession::open(self.connector, host, options) {
            Ok(session) => session,
            Err(error) => return contain(Stage::Connect, error),
        };

        let result = self.drive(&mut session, options);

        if let Err(e) = session.close() {
            log::warn!("{e}");
        }

        match result {
            Ok(outcome) => Ok(outcome),
            Err((stage, error)) => contain(stage, error),
        }
    }

    fn drive(
        &mut self,
        session: &mut PatchSession<'_>,
        options: &PatchOptions,
    ) -> std::result::Result<HostOutcome, (Stage, Error)> {
        let at = |stage: Stage| move |error: Error| (stage, error);
        let host = session.host().clone();

        let diff = session.discover_diff().map_err(at(Stage::Discover))?;
        let decision = session::decide(&diff, options.rollback);
        self.reporter.on_decision(&host, &diff, &decision);

        if !decision.is_mutating() {
            log::warn!(
                "No diffs in tag {} on {}, nothing to patch",
                options.target(),
                host.hostname
            );
            return Ok(HostOutcome::UpToDate {
                current_tag: diff.current_tag,
            });
        }

        let question = session::prompt(&host, &diff, &decision, options.target());
        if !session::confirm(&decision, &question, options, &mut *self.confirm)
            .map_err(at(Stage::Confirm))?
        {
            return Ok(HostOutcome::Declined);
        }

        session
            .apply(&decision, &diff.current_tag)
            .map_err(at(Stage::Apply))?;
        self.reporter.on_applied(&host, &decision);

        session.restart().map_err(at(Stage::Restart))?;

        Ok(match decision {
            Decision::Patch { commits } => HostOutcome::Patched {
                from: diff.current_tag,
                to: options.target().to_string(),
                commits,
            },
            _ => HostOutcome::RolledBack {
                tag: diff.current_tag,
            },
        })
    }
}

/// Turn a per-host error into a failed outcome; fatal errors propagate.
fn contain(stage: Stage, error: Error) -> Result<HostOutcome> {
    if error.is_fatal() {
        return Err(error);
    }
    log::error!("{} failed: {}", stage, error);
    Ok(HostOutcome::Failed { stage, error })
}
