//! Per-host patch session.
//!
//! A session owns one connection and the command template for one host. The
//! orchestrator drives it through a fixed sequence:
//!
//! 1. [`PatchSession::discover_diff`] - current tag, tag list, commit log
//! 2. [`decide`] - no-op, patch, or rollback
//! 3. [`confirm`] - operator approval unless auto-confirmed
//! 4. [`PatchSession::apply`] - reset or diff-apply
//! 5. [`PatchSession::restart`] - run the restart command
//!
//! Nothing mutating runs before discovery, and the restart only runs after
//! a successful apply.

use crate::backend::{Connection, Connector};
use crate::compose::CommandTemplate;
use crate::confirm::Confirm;
use crate::error::{Error, Result};
use crate::git;
use crate::types::{Decision, DiffResult, ExecResult, HostRecord, PatchOptions, validate_tag};

/// Remote work for one host.
pub struct PatchSession<'a> {
    host: &'a HostRecord,
    options: &'a PatchOptions,
    connection: Box<dyn Connection>,
    template: CommandTemplate,
}

impl<'a> PatchSession<'a> {
    /// Connect to `host` and resolve the command template.
    pub fn open(
        connector: &dyn Connector,
        host: &'a HostRecord,
        options: &'a PatchOptions,
    ) -> Result<Self> {
        let connection = connector.connect(host, options)?;
        Ok(Self::with_connection(connection, host, options))
    }

    /// Build a session over an already open connection.
    pub fn with_connection(
        connection: Box<dyn Connection>,
        host: &'a HostRecord,
        options: &'a PatchOptions,
    ) -> Self {
        Self {
            host,
            options,
            connection,
            template: CommandTemplate::new(options),
        }
    }

    /// The host this session works on.
    pub fn host(&self) -> &HostRecord {
        self.host
    }

    fn run(&mut self, command: &str) -> Result<ExecResult> {
        let composed = self.template.render(command);
        log::info!("[{}] {}", self.host.hostname, composed);
        self.connection.execute(&composed)
    }

    /// Look up the current tag and the commits between it and the target.
    ///
    /// Fails with [`Error::UnknownTag`] when the target tag is not known to
    /// the remote repository, unless this is a rollback. A rollback to an
    /// unknown target logs up to `HEAD` instead.
    pub fn discover_diff(&mut self) -> Result<DiffResult> {
        log::info!("[{}] Looking up project's current tag", self.host.hostname);

        let current_tag = self.run(&git::describe())?.stdout.trim().to_string();
        let tags = git::lines(&self.run(&git::tags())?.stdout);

        let options = self.options;
        let mut target = options.target();
        if !tags.iter().any(|t| t == target) {
            if !options.rollback {
                return Err(Error::UnknownTag {
                    host: self.host.hostname.clone(),
                    tag: target.to_string(),
                });
            }
            target = "";
        }
        self.require_tag(&current_tag)?;

        let commits = git::lines(&self.run(&git::log(&current_tag, target))?.stdout);
        log::debug!(
            "[{}] on {} with {} commit(s) to {}",
            self.host.hostname,
            current_tag,
            commits.len(),
            if target.is_empty() { "HEAD" } else { target }
        );

        Ok(DiffResult {
            current_tag,
            commits,
        })
    }

    /// The current tag ends up in remote shell commands, so it gets the same
    /// check as the target tag.
    fn require_tag(&self, tag: &str) -> Result<()> {
        if tag.is_empty() {
            return Err(Error::MissingTag {
                host: self.host.hostname.clone(),
            });
        }
        validate_tag(tag).map_err(|_| Error::InvalidTag {
            host: self.host.hostname.clone(),
            tag: tag.to_string(),
        })
    }

    /// Carry out a mutating decision. [`Decision::NoOp`] does nothing.
    pub fn apply(&mut self, decision: &Decision, current_tag: &str) -> Result<()> {
        match decision {
            Decision::NoOp => Ok(()),
            Decision::Rollback => self.apply_rollback(current_tag),
            Decision::Patch { .. } => self.apply_patch(current_tag),
        }
    }

    /// Hard-reset the working tree to `current_tag`.
    pub fn apply_rollback(&mut self, current_tag: &str) -> Result<()> {
        self.require_tag(current_tag)?;
        log::info!("[{}] Rolling back to {}", self.host.hostname, current_tag);
        self.run(&git::reset_hard(current_tag))?;
        Ok(())
    }

    /// Apply the diff between `current_tag` and the target tag, resetting
    /// first when requested.
    pub fn apply_patch(&mut self, current_tag: &str) -> Result<()> {
        self.require_tag(current_tag)?;
        log::info!("[{}] Patching remote host", self.host.hostname);

        if self.options.reset {
            log::info!(
                "[{}] Resetting remote codebase to {}",
                self.host.hostname,
                current_tag
            );
            self.run(&git::reset_hard(current_tag))
                .map_err(|e| self.patch_error(current_tag, e))?;
        }

        let target = self.options.target().to_string();
        self.run(&git::diff_apply(current_tag, &target))
            .map_err(|e| self.patch_error(current_tag, e))?;
        Ok(())
    }

    fn patch_error(&self, current_tag: &str, error: Error) -> Error {
        match error {
            Error::CommandFailed { stderr, .. } => Error::PatchFailed {
                host: self.host.hostname.clone(),
                from: current_tag.to_string(),
                to: self.options.target().to_string(),
                stderr,
            },
            other => other,
        }
    }

    /// Run the configured restart command.
    pub fn restart(&mut self) -> Result<()> {
        log::info!("[{}] Restarting application", self.host.hostname);
        let command = self.options.restart_command.clone();
        self.run(&command).map_err(|e| match e {
            Error::CommandFailed { stderr, .. } => Error::RestartFailed {
                host: self.host.hostname.clone(),
                stderr,
            },
            other => other,
        })?;
        Ok(())
    }

    /// Close the underlying connection.
    pub fn close(mut self) -> Result<()> {
        self.connection.close()
    }
}

/// Choose the action for a host.
pub fn decide(diff: &DiffResult, rollback: bool) -> Decision {
    if rollback {
        Decision::Rollback
    } else if diff.is_up_to_date() {
        Decision::NoOp
    } else {
        Decision::Patch {
            commits: diff.commits.len(),
        }
    }
}

/// Question shown to the operator before acting on a host.
pub fn prompt(host: &HostRecord, diff: &DiffResult, decision: &Decision, target: &str) -> String {
    match decision {
        Decision::Rollback => format!(
            "Remote host {} is on tag {}, rollback to this version?",
            host.hostname, diff.current_tag
        ),
        Decision::Patch { commits } => format!(
            "Remote host is on tag {}, patch host {} with tag {} ({} commits)?",
            diff.current_tag, host.hostname, target, commits
        ),
        Decision::NoOp => format!(
            "Remote host {} is on tag {}, nothing to patch",
            host.hostname, diff.current_tag
        ),
    }
}

/// Ask for approval of a mutating decision.
///
/// Auto-confirm skips the callback entirely; a no-op is never approved.
pub fn confirm(
    decision: &Decision,
    question: &str,
    options: &PatchOptions,
    callback: &mut dyn Confirm,
) -> Result<bool> {
    if !decision.is_mutating() {
        return Ok(false);
    }
    if options.auto_confirm {
        return Ok(true);
    }
    callback.confirm(question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingConfirm, Script, ScriptedConnector, is_mutating, options};

    fn host() -> HostRecord {
        HostRecord::online("web1", "10.0.0.1")
    }

    #[test]
    fn test_discover_diff() {
        let connector = ScriptedConnector::new().host(
            "web1",
            Script::on_tag("1.2.2", &["1.2.1", "1.2.2", "1.2.3"], &["abc123 Fix cart"]),
        );
        let host = host();
        let opts = options("1.2.3");
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();

        let diff = session.discover_diff().unwrap();
        assert_eq!(diff.current_tag, "1.2.2");
        assert_eq!(diff.commits, vec!["abc123 Fix cart"]);

        assert_eq!(
            connector.journal().commands_for("web1"),
            vec![
                "cd /srv/www/shop/current && git fetch --all >/dev/null && git describe",
                "cd /srv/www/shop/current && git tag",
                "cd /srv/www/shop/current && git log --oneline 1.2.2..1.2.3",
            ]
        );
    }

    #[test]
    fn test_unknown_tag_fails_before_mutation() {
        let connector =
            ScriptedConnector::new().host("web1", Script::on_tag("1.2.2", &["1.2.2"], &[]));
        let host = host();
        let opts = options("9.9.9");
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();

        let err = session.discover_diff().unwrap_err();
        assert!(matches!(err, Error::UnknownTag { ref tag, .. } if tag == "9.9.9"));

        let commands = connector.journal().commands_for("web1");
        assert_eq!(commands.len(), 2);
        assert!(!commands.iter().any(|c| is_mutating(c)));
    }

    #[test]
    fn test_rollback_skips_tag_membership() {
        let connector = ScriptedConnector::new().host(
            "web1",
            Script::on_tag("1.2.2", &["1.2.2"], &["abc123 Hotfix applied on top"]),
        );
        let host = host();
        let opts = PatchOptions {
            rollback: true,
            ..options("9.9.9")
        };
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();

        let diff = session.discover_diff().unwrap();
        let decision = decide(&diff, opts.rollback);
        assert_eq!(decision, Decision::Rollback);
        session.apply(&decision, &diff.current_tag).unwrap();

        let commands = connector.journal().commands_for("web1");
        assert_eq!(
            commands[2..],
            [
                "cd /srv/www/shop/current && git log --oneline 1.2.2..".to_string(),
                "cd /srv/www/shop/current && git reset --hard 1.2.2".to_string(),
            ]
        );
    }

    #[test]
    fn test_current_tag_with_shell_characters_is_rejected() {
        let connector = ScriptedConnector::new().host(
            "web1",
            Script::on_tag("1.2.2';reboot;'", &["1.2.3"], &[]),
        );
        let host = host();
        let opts = options("1.2.3");
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();

        assert!(matches!(
            session.discover_diff().unwrap_err(),
            Error::InvalidTag { ref tag, .. } if tag == "1.2.2';reboot;'"
        ));
        assert!(matches!(
            session.apply_rollback("1.2.2 && reboot").unwrap_err(),
            Error::InvalidTag { .. }
        ));
        assert!(matches!(
            session.apply_patch("1.2.2|reboot").unwrap_err(),
            Error::InvalidTag { .. }
        ));

        let commands = connector.journal().commands_for("web1");
        assert_eq!(commands.len(), 2);
        assert!(!commands.iter().any(|c| is_mutating(c)));
    }

    #[test]
    fn test_described_commit_is_accepted() {
        let connector = ScriptedConnector::new().host(
            "web1",
            Script::on_tag("1.2.2-3-gabc1234", &["1.2.2", "1.2.3"], &["abc123 Fix"]),
        );
        let host = host();
        let opts = options("1.2.3");
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();

        assert_eq!(session.discover_diff().unwrap().current_tag, "1.2.2-3-gabc1234");
    }

    #[test]
    fn test_rollback_without_target_logs_to_head() {
        let connector =
            ScriptedConnector::new().host("web1", Script::on_tag("1.2.2", &["1.2.2"], &[]));
        let host = host();
        let opts = PatchOptions {
            rollback: true,
            target_tag: None,
            ..options("1.2.3")
        };
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();
        session.discover_diff().unwrap();

        assert!(
            connector
                .journal()
                .commands_for("web1")
                .contains(&"cd /srv/www/shop/current && git log --oneline 1.2.2..".to_string())
        );
    }

    #[test]
    fn test_missing_current_tag() {
        let connector =
            ScriptedConnector::new().host("web1", Script::on_tag("", &["1.2.3"], &[]));
        let host = host();
        let opts = options("1.2.3");
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();

        assert!(matches!(
            session.discover_diff().unwrap_err(),
            Error::MissingTag { .. }
        ));
        assert!(matches!(
            session.apply_rollback("").unwrap_err(),
            Error::MissingTag { .. }
        ));
        assert!(matches!(
            session.apply_patch("").unwrap_err(),
            Error::MissingTag { .. }
        ));
        assert!(
            !connector
                .journal()
                .commands_for("web1")
                .iter()
                .any(|c| is_mutating(c))
        );
    }

    #[test]
    fn test_patch_with_reset_order() {
        let connector = ScriptedConnector::new().host(
            "web1",
            Script::on_tag("1.2.2", &["1.2.2", "1.2.3"], &["abc123 Fix"]),
        );
        let host = host();
        let opts = PatchOptions {
            reset: true,
            ..options("1.2.3")
        };
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();
        session.apply_patch("1.2.2").unwrap();

        assert_eq!(
            connector.journal().commands_for("web1"),
            vec![
                "cd /srv/www/shop/current && git reset --hard 1.2.2",
                "cd /srv/www/shop/current && git diff 1.2.2..1.2.3 -- | git apply -v -",
            ]
        );
    }

    #[test]
    fn test_patch_without_reset() {
        let connector = ScriptedConnector::new().host("web1", Script::default());
        let host = host();
        let opts = options("1.2.3");
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();
        session.apply_patch("1.2.2").unwrap();

        assert_eq!(
            connector.journal().commands_for("web1"),
            vec!["cd /srv/www/shop/current && git diff 1.2.2..1.2.3 -- | git apply -v -"]
        );
    }

    #[test]
    fn test_failed_apply_is_patch_error() {
        let connector = ScriptedConnector::new()
            .host("web1", Script::default().failing_on("git apply"));
        let host = host();
        let opts = options("1.2.3");
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();

        match session.apply_patch("1.2.2").unwrap_err() {
            Error::PatchFailed { from, to, stderr, .. } => {
                assert_eq!(from, "1.2.2");
                assert_eq!(to, "1.2.3");
                assert!(stderr.contains("failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failed_reset_is_patch_error() {
        let connector = ScriptedConnector::new()
            .host("web1", Script::default().failing_on("git reset"));
        let host = host();
        let opts = PatchOptions {
            reset: true,
            ..options("1.2.3")
        };
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();

        assert!(matches!(
            session.apply_patch("1.2.2").unwrap_err(),
            Error::PatchFailed { .. }
        ));
        assert_eq!(connector.journal().commands_for("web1").len(), 1);
    }

    #[test]
    fn test_restart_failure_is_distinct() {
        let connector = ScriptedConnector::new()
            .host("web1", Script::default().failing_on("restart.txt"));
        let host = host();
        let opts = options("1.2.3");
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();

        assert!(matches!(
            session.restart().unwrap_err(),
            Error::RestartFailed { .. }
        ));
        assert_eq!(
            connector.journal().commands_for("web1"),
            vec!["cd /srv/www/shop/current && touch tmp/restart.txt"]
        );
    }

    #[test]
    fn test_composes_with_sudo_and_deploy_user() {
        let connector = ScriptedConnector::new().host("web1", Script::default());
        let host = host();
        let opts = PatchOptions {
            sudo: true,
            deploy_user: Some("deploy".into()),
            ..options("1.2.3")
        };
        let mut session = PatchSession::open(&connector, &host, &opts).unwrap();
        session.restart().unwrap();

        assert_eq!(
            connector.journal().commands_for("web1"),
            vec!["cd /srv/www/shop/current && sudo su deploy -c 'touch tmp/restart.txt'"]
        );
    }

    #[test]
    fn test_close_closes_connection() {
        let connector = ScriptedConnector::new().host("web1", Script::default());
        let host = host();
        let opts = options("1.2.3");
        let session = PatchSession::open(&connector, &host, &opts).unwrap();
        session.close().unwrap();

        assert_eq!(connector.journal().closes, vec!["web1"]);
    }

    #[test]
    fn test_decide() {
        let empty = DiffResult {
            current_tag: "1.2.3".into(),
            commits: vec![],
        };
        let behind = DiffResult {
            current_tag: "1.2.2".into(),
            commits: vec!["a Fix".into(), "b Fix".into()],
        };

        assert_eq!(decide(&empty, false), Decision::NoOp);
        assert_eq!(decide(&empty, true), Decision::Rollback);
        assert_eq!(decide(&behind, false), Decision::Patch { commits: 2 });
        assert_eq!(decide(&behind, true), Decision::Rollback);
    }

    #[test]
    fn test_prompt_text() {
        let diff = DiffResult {
            current_tag: "1.2.2".into(),
            commits: vec!["a Fix".into()],
        };
        assert_eq!(
            prompt(&host(), &diff, &Decision::Patch { commits: 1 }, "1.2.3"),
            "Remote host is on tag 1.2.2, patch host web1 with tag 1.2.3 (1 commits)?"
        );
        assert_eq!(
            prompt(&host(), &diff, &Decision::Rollback, ""),
            "Remote host web1 is on tag 1.2.2, rollback to this version?"
        );
    }

    #[test]
    fn test_auto_confirm_never_prompts() {
        let opts = PatchOptions {
            auto_confirm: true,
            ..options("1.2.3")
        };
        let mut callback = RecordingConfirm::answering(false);

        assert!(confirm(&Decision::Patch { commits: 1 }, "?", &opts, &mut callback).unwrap());
        assert!(callback.prompts.is_empty());
    }

    #[test]
    fn test_confirm_asks_callback() {
        let opts = options("1.2.3");
        let mut callback = RecordingConfirm::answering(false);

        assert!(!confirm(&Decision::Rollback, "Roll back?", &opts, &mut callback).unwrap());
        assert_eq!(callback.prompts, vec!["Roll back?"]);
    }

    #[test]
    fn test_noop_is_never_confirmed() {
        let opts = options("1.2.3");
        let mut callback = RecordingConfirm::answering(true);

        assert!(!confirm(&Decision::NoOp, "?", &opts, &mut callback).unwrap());
        assert!(callback.prompts.is_empty());
    }
}
