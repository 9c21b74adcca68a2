//! Remote command composition.
//!
//! Every remote command runs inside the document root, optionally under
//! sudo and optionally as the deploy user:
//!
//! ```text
//! cd <docroot> && [sudo] [su <deploy_user> -c '<command>' | <command>]
//! ```
//!
//! No quoting is applied to the command itself beyond the `su -c` wrapping.

use crate::types::PatchOptions;

/// The fixed part of a composed command, resolved once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    prefix: String,
    suffix: &'static str,
}

impl CommandTemplate {
    /// Resolve the template for a set of options.
    pub fn new(options: &PatchOptions) -> Self {
        let mut parts = vec![format!("cd {} &&", options.docroot)];
        if options.sudo {
            parts.push("sudo".to_string());
        }

        let suffix = match options.deploy_user() {
            Some(user) => {
                parts.push(format!("su {user} -c '"));
                "'"
            }
            None => {
                parts.push(String::new());
                ""
            }
        };

        Self {
            prefix: parts.join(" "),
            suffix,
        }
    }

    /// Substitute a raw command into the template.
    pub fn render(&self, command: &str) -> String {
        format!("{}{}{}", self.prefix, command, self.suffix)
    }
}

/// Compose a raw command for the given options.
pub fn compose(command: &str, options: &PatchOptions) -> String {
    CommandTemplate::new(options).render(command)
}
