//! Terminal implementations of the patchkit prompt and progress hooks.

use crate::ui;
use colored::Colorize;
use patchkit::{
    Confirm, Decision, DiffResult, HostOutcome, HostRecord, Reporter, RunSummary, SkipReason,
};

/// Yes/no prompt on the controlling terminal, defaulting to yes.
pub struct DialoguerConfirm;

impl Confirm for DialoguerConfirm {
    fn confirm(&mut self, prompt: &str) -> patchkit::Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(|e| patchkit::Error::Prompt {
                message: e.to_string(),
            })
    }
}

/// Prints per-host progress as the run goes.
pub struct TerminalReporter {
    quiet: bool,
}

impl TerminalReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for TerminalReporter {
    fn on_skip(&mut self, host: &HostRecord, reason: &SkipReason) {
        if !self.quiet {
            ui::dim(&format!("Skipping {}: {reason}", host.hostname));
        }
    }

    fn on_host_start(&mut self, host: &HostRecord) {
        if self.quiet {
            return;
        }
        let address = host.public_ip.as_deref().unwrap_or("no address");
        ui::header(&format!("{} ({address})", host.hostname));
    }

    fn on_decision(&mut self, host: &HostRecord, diff: &DiffResult, decision: &Decision) {
        if self.quiet {
            return;
        }
        match decision {
            Decision::NoOp => {}
            Decision::Patch { commits } => {
                ui::info(&format!(
                    "{} is on tag {}, {} to apply",
                    host.hostname,
                    diff.current_tag.cyan(),
                    ui::plural(*commits, "commit")
                ));
                for commit in &diff.commits {
                    ui::dim(commit);
                }
            }
            Decision::Rollback => {
                ui::info(&format!(
                    "{} is on tag {}, rolling back local changes",
                    host.hostname,
                    diff.current_tag.cyan()
                ));
            }
        }
    }

    fn on_applied(&mut self, host: &HostRecord, decision: &Decision) {
        if !self.quiet {
            let action = match decision {
                Decision::Rollback => "Rolled back",
                _ => "Patched",
            };
            ui::dim(&format!("{action} {}, restarting application", host.hostname));
        }
    }

    fn on_outcome(&mut self, host: &HostRecord, outcome: &HostOutcome) {
        match outcome {
            HostOutcome::Failed { error, .. } => {
                ui::error(&describe(&host.hostname, outcome));
                if let Some(stderr) = error.stderr().filter(|s| !s.is_empty()) {
                    for line in stderr.lines() {
                        eprintln!("    {}", line.dimmed());
                    }
                }
                eprintln!("  {}", error.category().advice().dimmed());
            }
            _ if self.quiet => {}
            HostOutcome::Declined => ui::warn(&format!("Skipped {}", host.hostname)),
            other => ui::success(&describe(&host.hostname, other)),
        }
    }
}

/// One-line description of a finished host.
pub fn describe(hostname: &str, outcome: &HostOutcome) -> String {
    match outcome {
        HostOutcome::UpToDate { current_tag } => {
            format!("{hostname} is up to date on {current_tag}")
        }
        HostOutcome::Declined => format!("{hostname} skipped by operator"),
        HostOutcome::Patched { from, to, commits } => format!(
            "{hostname} patched from {from} to {to} ({})",
            ui::plural(*commits, "commit")
        ),
        HostOutcome::RolledBack { tag } => format!("{hostname} rolled back to {tag}"),
        HostOutcome::Failed { stage, error } if outcome.changed_codebase() => {
            format!("{hostname} failed during {stage} after its codebase changed: {error}")
        }
        HostOutcome::Failed { stage, error } => {
            format!("{hostname} failed during {stage}: {error}")
        }
    }
}

/// Print the end-of-run summary.
pub fn print_summary(summary: &RunSummary) {
    ui::header("Summary");
    ui::kv("Patched", &summary.patched.to_string());
    ui::kv("Rolled back", &summary.rolled_back.to_string());
    ui::kv("Up to date", &summary.up_to_date.to_string());
    ui::kv("Declined", &summary.declined.to_string());
    ui::kv("Skipped", &summary.skipped.to_string());
    ui::kv("Failed", &summary.failures.len().to_string());

    if summary.attempted() == 0 {
        ui::warn("No hosts were eligible for patching");
    }
    for failure in &summary.failures {
        ui::error(&format!(
            "{} ({}): {}",
            failure.hostname, failure.stage, failure.error
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchkit::{Error, Stage};

    #[test]
    fn test_describe_patched() {
        let outcome = HostOutcome::Patched {
            from: "1.2.2".into(),
            to: "1.2.3".into(),
            commits: 1,
        };
        assert_eq!(
            describe("web1", &outcome),
            "web1 patched from 1.2.2 to 1.2.3 (1 commit)"
        );
    }

    #[test]
    fn test_describe_up_to_date() {
        let outcome = HostOutcome::UpToDate {
            current_tag: "1.2.3".into(),
        };
        assert_eq!(describe("web1", &outcome), "web1 is up to date on 1.2.3");
    }

    #[test]
    fn test_describe_failure_names_stage() {
        let outcome = HostOutcome::Failed {
            stage: Stage::Discover,
            error: Error::UnknownTag {
                host: "web1".into(),
                tag: "9.9.9".into(),
            },
        };
        assert!(describe("web1", &outcome).starts_with("web1 failed during discover:"));
    }

    #[test]
    fn test_describe_restart_failure_mentions_changed_codebase() {
        let outcome = HostOutcome::Failed {
            stage: Stage::Restart,
            error: Error::RestartFailed {
                host: "web1".into(),
                stderr: "touch: cannot touch".into(),
            },
        };
        assert!(
            describe("web1", &outcome)
                .starts_with("web1 failed during restart after its codebase changed")
        );
    }
}
