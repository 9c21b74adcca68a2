//! # patchkit
//!
//! Apply or roll back git tag hotfixes on remote hosts over SSH.
//!
//! For every online host the [`Orchestrator`] opens a [`PatchSession`] that:
//! - Reads the current tag with `git describe` and checks the target tag exists
//! - Logs the commits between the current and target tag
//! - Asks for confirmation (unless auto-confirmed)
//! - Applies `git diff <current>..<target> | git apply`, or hard-resets for a rollback
//! - Runs the restart command
//!
//! A failure on one host is recorded and the run moves on to the next host.
//!
//! ## Example
//!
//! ```no_run
//! use patchkit::{AutoConfirm, HostRecord, NoReport, Orchestrator, PatchOptions};
//! use patchkit::backend::ssh::SshConnector;
//!
//! let options = PatchOptions {
//!     target_tag: Some("1.2.3".into()),
//!     ssh_user: "ubuntu".into(),
//!     identity_file: "/home/ops/.ssh/id_rsa".into(),
//!     auto_confirm: true,
//!     ..Default::default()
//! }
//! .with_project("shop");
//!
//! let hosts = vec![HostRecord::online("web1", "10.0.0.1")];
//! let connector = SshConnector::new();
//! let summary = Orchestrator::new(&connector, &mut AutoConfirm, &mut NoReport)
//!     .run(&hosts, &options)
//!     .expect("invalid options");
//! println!("{} patched, {} failed", summary.patched, summary.failures.len());
//! ```
//!
//! ## Transports
//!
//! Remote commands go through the [`backend::Connector`] trait. The default
//! [`backend::ssh::SshConnector`] keeps one OpenSSH control master per host.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod compose;
pub mod confirm;
pub mod error;
pub mod git;
pub mod orchestrator;
pub mod report;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

pub use compose::{CommandTemplate, compose};
pub use confirm::{AutoConfirm, Confirm, NoPrompt, NoReport, Reporter};
pub use error::{Error, ErrorCategory, Result};
pub use orchestrator::Orchestrator;
pub use report::{HostFailure, HostOutcome, RunSummary, SkipReason, Stage};
pub use session::PatchSession;
pub use types::{
    Decision, DiffResult, ExecResult, ExitStatus, HostRecord, PROJECT_PLACEHOLDER, PatchOptions,
};
