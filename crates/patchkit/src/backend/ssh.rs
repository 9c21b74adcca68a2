//! OpenSSH backend using a multiplexed master connection per host.
//!
//! Connecting starts `ssh` as a control master in the background; every
//! command then reuses the control socket, so a session authenticates once
//! no matter how many commands it runs.

use crate::backend::{Connection, Connector};
use crate::error::{Error, Result};
use crate::types::{ExecResult, HostRecord, PatchOptions};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Seconds to wait for the TCP connection and authentication.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Exit status of the ssh client itself failing, as opposed to the remote command.
const SSH_ERROR_STATUS: i32 = 255;

/// Hostname characters kept in a socket name. `sun_path` is 104 bytes on macOS
/// and `$TMPDIR` there is already about 50.
const SOCKET_HOST_CHARS: usize = 16;

/// Connector that shells out to the system `ssh` client.
pub struct SshConnector {
    /// Path to the ssh executable
    program: String,
    /// Directory for control sockets and master logs
    control_dir: PathBuf,
    /// Connections opened so far, keeps socket names unique
    opened: AtomicUsize,
}

impl SshConnector {
    /// Create a connector using `ssh` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: "ssh".to_string(),
            control_dir: std::env::temp_dir(),
            opened: AtomicUsize::new(0),
        }
    }

    /// Create a connector with a custom ssh program (useful for wrappers).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::new()
        }
    }

    fn control_path(&self, hostname: &str) -> PathBuf {
        let safe: String = hostname
            .chars()
            .take(SOCKET_HOST_CHARS)
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let seq = self.opened.fetch_add(1, Ordering::Relaxed);
        self.control_dir
            .join(format!("hotfixer-{}-{seq}-{safe}.sock", std::process::id()))
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for SshConnector {
    fn connect(&self, host: &HostRecord, options: &PatchOptions) -> Result<Box<dyn Connection>> {
        let connection_error = |message: String| Error::Connection {
            host: host.hostname.clone(),
            message,
        };

        if options.identity_file.as_os_str().is_empty() {
            return Err(connection_error("public key not specified".to_string()));
        }
        let address = host
            .public_ip
            .as_deref()
            .filter(|ip| ip.parse::<IpAddr>().is_ok())
            .ok_or_else(|| {
                connection_error(format!(
                    "invalid IP address specified: {}",
                    host.public_ip.as_deref().unwrap_or("<none>")
                ))
            })?;

        let control_path = self.control_path(&host.hostname);
        let log_path = control_path.with_extension("log");

        log::info!(
            "Opening SSH connection to {} ({}) as {}",
            host.hostname,
            address,
            options.ssh_user
        );

        let status = Command::new(&self.program)
            .args(["-M", "-N", "-f"])
            .arg("-S")
            .arg(&control_path)
            .arg("-E")
            .arg(&log_path)
            .arg("-i")
            .arg(&options.identity_file)
            .args(["-l", &options.ssh_user])
            .args(["-o", "ControlPersist=yes"])
            .args(["-o", "Compression=yes"])
            .args(["-o", "BatchMode=yes"])
            .args(["-o", "StrictHostKeyChecking=accept-new"])
            .arg("-o")
            .arg(format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"))
            .arg(address)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| connection_error(format!("failed to execute {}: {e}", self.program)))?;

        if !status.success() {
            let detail = std::fs::read_to_string(&log_path).unwrap_or_default();
            let _ = std::fs::remove_file(&log_path);
            return Err(connection_error(format!(
                "ssh master exited with {}{}",
                crate::types::ExitStatus::from(status),
                if detail.trim().is_empty() {
                    String::new()
                } else {
                    format!(": {}", detail.trim())
                }
            )));
        }

        Ok(Box::new(SshConnection {
            program: self.program.clone(),
            host: host.hostname.clone(),
            address: address.to_string(),
            user: options.ssh_user.clone(),
            control_path,
            log_path,
            open: true,
        }))
    }
}

/// A live control-master session.
pub struct SshConnection {
    program: String,
    host: String,
    address: String,
    user: String,
    control_path: PathBuf,
    log_path: PathBuf,
    open: bool,
}

impl SshConnection {
    fn base_command(&self, control_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-S")
            .arg(control_path)
            .args(["-o", "ControlMaster=no"])
            .args(["-l", &self.user]);
        cmd
    }
}

impl Connection for SshConnection {
    fn execute(&mut self, command: &str) -> Result<ExecResult> {
        if !self.open {
            return Err(Error::Connection {
                host: self.host.clone(),
                message: "connection already closed".to_string(),
            });
        }

        let output = self
            .base_command(&self.control_path)
            .arg(&self.address)
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Connection {
                host: self.host.clone(),
                message: format!("failed to execute {}: {e}", self.program),
            })?;

        let result = ExecResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status.into(),
        };
        log::debug!("[{}] {} -> {}", self.host, command, result.status);
        log::trace!("[{}] stdout:\n{}", self.host, result.stdout);

        check_client_status(&self.host, command, result)
    }

    fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        log::info!("Closing connection to {}", self.host);
        let status = self
            .base_command(&self.control_path)
            .args(["-O", "exit"])
            .arg(&self.address)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        let _ = std::fs::remove_file(&self.log_path);

        match status {
            Ok(s) if s.success() => Ok(()),
            Ok(s) => Err(Error::Connection {
                host: self.host.clone(),
                message: format!("ssh -O exit returned {}", crate::types::ExitStatus::from(s)),
            }),
            Err(e) => Err(Error::Connection {
                host: self.host.clone(),
                message: format!("failed to execute {}: {e}", self.program),
            }),
        }
    }
}

/// Exit 255 means the ssh client lost the connection, not that the remote
/// command failed.
fn check_client_status(host: &str, command: &str, result: ExecResult) -> Result<ExecResult> {
    if result.status.code() == Some(SSH_ERROR_STATUS) {
        let detail = result.stderr.trim();
        return Err(Error::Connection {
            host: host.to_string(),
            message: if detail.is_empty() {
                "connection lost".to_string()
            } else {
                format!("connection lost: {detail}")
            },
        });
    }
    result.into_checked(host, command)
}

impl Drop for SshConnection {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("{e}");
        }
    }
}
