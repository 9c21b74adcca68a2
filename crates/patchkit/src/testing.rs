//! Scripted in-memory transport for tests.

use crate::backend::{Connection, Connector};
use crate::error::{Error, Result};
use crate::types::{ExecResult, ExitStatus, HostRecord, PatchOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What a scripted host answers.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub describe: String,
    pub tags: Vec<String>,
    pub log: Vec<String>,
    /// Commands containing any of these fragments exit 1
    pub fail_on: Vec<String>,
    pub refuse_connection: bool,
}

impl Script {
    pub fn on_tag(current: &str, tags: &[&str], log: &[&str]) -> Self {
        Self {
            describe: format!("{current}\n"),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            log: log.iter().map(|l| (*l).to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on.push(fragment.to_string());
        self
    }

    pub fn refusing(mut self) -> Self {
        self.refuse_connection = true;
        self
    }
}

/// Everything the fake transport observed.
#[derive(Debug, Default)]
pub struct Journal {
    pub connects: Vec<String>,
    pub commands: Vec<(String, String)>,
    pub closes: Vec<String>,
}

impl Journal {
    pub fn commands_for(&self, host: &str) -> Vec<String> {
        self.commands
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

#[derive(Default)]
pub struct ScriptedConnector {
    scripts: HashMap<String, Script>,
    pub journal: Arc<Mutex<Journal>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, hostname: &str, script: Script) -> Self {
        self.scripts.insert(hostname.to_string(), script);
        self
    }

    pub fn journal(&self) -> std::sync::MutexGuard<'_, Journal> {
        self.journal.lock().unwrap()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, host: &HostRecord, _options: &PatchOptions) -> Result<Box<dyn Connection>> {
        self.journal
            .lock()
            .unwrap()
            .connects
            .push(host.hostname.clone());

        let script = self.scripts.get(&host.hostname).cloned().unwrap_or_default();
        if script.refuse_connection {
            return Err(Error::Connection {
                host: host.hostname.clone(),
                message: "connection refused".to_string(),
            });
        }

        Ok(Box::new(ScriptedConnection {
            host: host.hostname.clone(),
            script,
            journal: Arc::clone(&self.journal),
        }))
    }
}

pub struct ScriptedConnection {
    host: String,
    script: Script,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedConnection {
    /// A `git log` range whose target is not a known tag, as git would reject it.
    fn unknown_range<'c>(&self, command: &'c str) -> Option<&'c str> {
        let range = command
            .split("git log --oneline ")
            .nth(1)?
            .split_whitespace()
            .next()?;
        let (_, target) = range.split_once("..")?;
        (!target.is_empty() && !self.script.tags.iter().any(|t| t == target)).then_some(range)
    }
}

impl Connection for ScriptedConnection {
    fn execute(&mut self, command: &str) -> Result<ExecResult> {
        self.journal
            .lock()
            .unwrap()
            .commands
            .push((self.host.clone(), command.to_string()));

        if self.script.fail_on.iter().any(|f| command.contains(f.as_str())) {
            return ExecResult {
                stdout: String::new(),
                stderr: format!("error: {command} failed\n"),
                status: ExitStatus::Exited(1),
            }
            .into_checked(&self.host, command);
        }

        if let Some(range) = self.unknown_range(command) {
            return ExecResult {
                stdout: String::new(),
                stderr: format!("fatal: ambiguous argument '{range}': unknown revision\n"),
                status: ExitStatus::Exited(128),
            }
            .into_checked(&self.host, command);
        }

        let stdout = if command.contains("git describe") {
            self.script.describe.clone()
        } else if command.contains("git log") {
            self.script.log.join("\n")
        } else if command.contains("git tag") {
            self.script.tags.join("\n")
        } else {
            String::new()
        };
        Ok(ExecResult::ok(stdout))
    }

    fn close(&mut self) -> Result<()> {
        self.journal.lock().unwrap().closes.push(self.host.clone());
        Ok(())
    }
}

/// Confirmation double that records prompts.
pub struct RecordingConfirm {
    pub answer: bool,
    pub prompts: Vec<String>,
}

impl RecordingConfirm {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Vec::new(),
        }
    }
}

impl crate::confirm::Confirm for RecordingConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.prompts.push(prompt.to_string());
        Ok(self.answer)
    }
}

pub fn options(tag: &str) -> PatchOptions {
    PatchOptions {
        target_tag: Some(tag.to_string()),
        ssh_user: "ubuntu".into(),
        identity_file: "/home/ops/.ssh/id_rsa".into(),
        sudo: false,
        deploy_user: None,
        ..Default::default()
    }
    .with_project("shop")
}

/// Whether a composed command changes the remote codebase or process.
pub fn is_mutating(command: &str) -> bool {
    command.contains("git reset")
        || command.contains("git apply")
        || command.contains("restart.txt")
}
