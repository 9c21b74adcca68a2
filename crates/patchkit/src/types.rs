//! Core types for hotfix runs.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Placeholder in the document root replaced by the application name.
pub const PROJECT_PLACEHOLDER: &str = "<project>";

/// Status string reported for hosts that can be patched.
pub const ONLINE: &str = "online";

/// Tags are interpolated into remote shell pipelines, so only plain
/// ref-name characters are accepted.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/+-]*$").expect("valid tag regex"));

/// A remote host as reported by fleet discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    /// Hostname within the layer
    pub hostname: String,
    /// Public address used for SSH
    pub public_ip: Option<String>,
    /// Fleet status (e.g. "online", "stopped")
    pub status: String,
}

impl HostRecord {
    /// Create a host record.
    pub fn new(
        hostname: impl Into<String>,
        public_ip: Option<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            public_ip,
            status: status.into(),
        }
    }

    /// Create an online host record with a public address.
    pub fn online(hostname: impl Into<String>, public_ip: impl Into<String>) -> Self {
        Self::new(hostname, Some(public_ip.into()), ONLINE)
    }

    /// Whether the fleet reports this host as online.
    pub fn is_online(&self) -> bool {
        self.status == ONLINE
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOptions {
    /// Tag to patch to; optional only for rollbacks
    pub target_tag: Option<String>,
    /// Reset hosts to their current tag instead of patching
    pub rollback: bool,
    /// Hard-reset the working tree before applying the diff
    pub reset: bool,
    /// Prefix remote commands with sudo
    pub sudo: bool,
    /// Run remote commands as this user via `su`
    pub deploy_user: Option<String>,
    /// Command that restarts the remote application
    pub restart_command: String,
    /// Remote working tree
    pub docroot: String,
    /// SSH login user
    pub ssh_user: String,
    /// SSH private key
    pub identity_file: PathBuf,
    /// Never prompt before acting
    pub auto_confirm: bool,
    /// Only patch these hostnames (empty = all)
    pub instances: Vec<String>,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            target_tag: None,
            rollback: false,
            reset: false,
            sudo: true,
            deploy_user: Some("deploy".to_string()),
            restart_command: "touch tmp/restart.txt".to_string(),
            docroot: format!("/srv/www/{PROJECT_PLACEHOLDER}/current"),
            ssh_user: String::new(),
            identity_file: PathBuf::new(),
            auto_confirm: false,
            instances: Vec::new(),
        }
    }
}

impl PatchOptions {
    /// Substitute the application name into the document root.
    pub fn with_project(mut self, appname: &str) -> Self {
        self.docroot = self.docroot.replace(PROJECT_PLACEHOLDER, appname);
        self
    }

    /// The target tag, or an empty string for rollbacks without one.
    pub fn target(&self) -> &str {
        self.target_tag.as_deref().unwrap_or_default()
    }

    /// Deploy user, ignoring an empty value.
    pub fn deploy_user(&self) -> Option<&str> {
        self.deploy_user.as_deref().filter(|u| !u.is_empty())
    }

    /// Whether a hostname passes the explicit instance allowlist.
    pub fn selects(&self, hostname: &str) -> bool {
        self.instances.is_empty() || self.instances.iter().any(|i| i == hostname)
    }

    /// Check the invariants the session relies on.
    ///
    /// All problems are collected into a single configuration error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        match self.target_tag.as_deref() {
            Some(tag) if !tag.is_empty() => {
                if let Err(problem) = validate_tag(tag) {
                    problems.push(problem);
                }
            }
            _ if !self.rollback => problems.push("missing --tag".to_string()),
            _ => {}
        }

        if self.docroot.contains(PROJECT_PLACEHOLDER) {
            problems.push(format!(
                "docroot {} still contains {PROJECT_PLACEHOLDER}, set --appname",
                self.docroot
            ));
        }
        if self.docroot.trim().is_empty() {
            problems.push("missing --docroot".to_string());
        }
        if self.restart_command.trim().is_empty() {
            problems.push("restart command is empty".to_string());
        }
        if self.ssh_user.is_empty() {
            problems.push("missing --user".to_string());
        }
        if self.identity_file.as_os_str().is_empty() {
            problems.push("missing --identity".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Configuration { problems })
        }
    }
}

/// Check a tag name against the allowed ref-name characters.
pub fn validate_tag(tag: &str) -> std::result::Result<(), String> {
    if TAG_PATTERN.is_match(tag) && !tag.contains("..") {
        Ok(())
    } else {
        Err(format!("invalid tag name: {tag:?}"))
    }
}

/// How a remote command terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Exited with a status code
    Exited(i32),
    /// Killed by a signal
    Signaled(i32),
    /// Terminated without reporting a status
    Unknown,
}

impl ExitStatus {
    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// Numeric exit code, if the command exited normally.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }
        Self::Unknown
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exit {code}"),
            Self::Signaled(signal) => write!(f, "killed by signal {signal}"),
            Self::Unknown => write!(f, "unknown status"),
        }
    }
}

/// Output of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// How the command terminated
    pub status: ExitStatus,
}

impl ExecResult {
    /// A successful result with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            status: ExitStatus::Exited(0),
        }
    }

    /// Turn a non-zero exit into [`Error::CommandFailed`].
    pub fn into_checked(self, host: &str, command: &str) -> Result<Self> {
        if self.status.success() {
            Ok(self)
        } else {
            Err(Error::CommandFailed {
                host: host.to_string(),
                command: command.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Current tag of a host and the commits it is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    /// Tag reported by `git describe`
    pub current_tag: String,
    /// `git log --oneline` lines between the current and target tag
    pub commits: Vec<String>,
}

impl DiffResult {
    /// Whether the host already contains every target commit.
    pub fn is_up_to_date(&self) -> bool {
        self.commits.is_empty()
    }
}

/// What to do with a host after diff discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to apply
    NoOp,
    /// Apply the diff to the target tag
    Patch {
        /// Number of commits being applied
        commits: usize,
    },
    /// Reset the host to its current tag
    Rollback,
}

impl Decision {
    /// Whether acting on this decision changes the remote codebase.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::NoOp)
    }
}
