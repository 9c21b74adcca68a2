//! Transport abstraction for remote command execution.
//!
//! The [`Connector`] trait opens one [`Connection`] per host, allowing for
//! different implementations (OpenSSH, scripted transports for testing).

pub mod ssh;

use crate::error::Result;
use crate::types::{ExecResult, HostRecord, PatchOptions};

/// An open session to one host.
pub trait Connection: Send {
    /// Run one command and wait for it to finish.
    ///
    /// Fails with [`crate::Error::CommandFailed`] on any non-zero exit.
    fn execute(&mut self, command: &str) -> Result<ExecResult>;

    /// Tear the session down. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// Opens connections to hosts.
pub trait Connector: Send + Sync {
    /// Open a session to `host` using the SSH settings in `options`.
    fn connect(&self, host: &HostRecord, options: &PatchOptions) -> Result<Box<dyn Connection>>;
}
