use crate::cli::Cli;
use crate::paths;
use anyhow::{Context, Result};
use opsworks::Credentials;
use patchkit::PatchOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LAYER: &str = "rails-app";
pub const DEFAULT_REGION: &str = "us-east-1";

// ============================================================================
// Config File
// ============================================================================

/// Defaults read from `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub stack_id: Option<String>,
    pub layer: Option<String>,
    pub user: Option<String>,
    pub identity: Option<PathBuf>,
    /// An empty string runs commands as the SSH user
    pub deploy_user: Option<String>,
    pub sudo: Option<bool>,
    pub restart_cmd: Option<String>,
    pub aws_region: Option<String>,
    pub aws_profile: Option<String>,
    pub appname: Option<String>,
    pub docroot: Option<String>,
    pub instances: Vec<String>,
}

impl FileConfig {
    /// Load the config file.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => paths::expand(path),
            None => {
                let path = paths::config_file()?;
                if !path.exists() {
                    log::debug!("No config file at {}", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        log::debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

// ============================================================================
// Resolved Config
// ============================================================================

/// Everything a run needs, after merging flags, file and defaults.
#[derive(Debug)]
pub struct RunConfig {
    pub stack_id: String,
    pub layer: String,
    pub region: String,
    pub credentials: Credentials,
    pub options: PatchOptions,
}

impl RunConfig {
    /// Merge flags over file values over built-in defaults.
    ///
    /// Every problem is collected into one configuration error.
    pub fn resolve(cli: &Cli, file: FileConfig) -> patchkit::Result<Self> {
        let mut problems = Vec::new();

        let stack_id = non_empty(cli.stack_id.clone().or(file.stack_id));
        if stack_id.is_none() {
            problems.push("missing --stack-id".to_string());
        }

        let appname = non_empty(cli.appname.clone().or(file.appname));
        if appname.is_none() {
            problems.push("missing --appname".to_string());
        }

        let profile = non_empty(cli.aws_profile.clone().or(file.aws_profile));
        let credentials = match (
            non_empty(cli.aws_key.clone()),
            non_empty(cli.aws_secret.clone()),
            profile,
        ) {
            (Some(access_key), Some(secret_key), _) => Some(Credentials::Keys {
                access_key,
                secret_key,
            }),
            (_, _, Some(profile)) => Some(Credentials::Profile(profile)),
            _ => {
                problems.push(
                    "missing AWS credentials, set --aws-key and --aws-secret or --aws-profile"
                        .to_string(),
                );
                None
            }
        };

        let defaults = PatchOptions::default();
        let deploy_user = if cli.no_deploy_user {
            None
        } else {
            cli.deploy_user
                .clone()
                .or(file.deploy_user)
                .or(defaults.deploy_user)
        };
        let identity_file = cli
            .identity
            .clone()
            .or(file.identity)
            .map(|p| paths::expand(&p))
            .unwrap_or_default();
        let instances = if cli.instance.is_empty() {
            file.instances
        } else {
            cli.instance.clone()
        };

        let mut options = PatchOptions {
            target_tag: non_empty(cli.tag.clone()),
            rollback: cli.rollback,
            reset: cli.reset,
            sudo: cli.sudo.or(file.sudo).unwrap_or(defaults.sudo),
            deploy_user,
            restart_command: cli
                .restart_cmd
                .clone()
                .or(file.restart_cmd)
                .unwrap_or(defaults.restart_command),
            docroot: cli
                .docroot
                .clone()
                .or(file.docroot)
                .unwrap_or(defaults.docroot),
            ssh_user: cli.user.clone().or(file.user).unwrap_or_default(),
            identity_file,
            auto_confirm: cli.yes,
            instances,
        };
        if let Some(appname) = &appname {
            options = options.with_project(appname);
        }

        if let Err(patchkit::Error::Configuration { problems: more }) = options.validate() {
            // The placeholder problem restates the missing app name.
            problems.extend(
                more.into_iter()
                    .filter(|p| appname.is_some() || !p.contains("--appname")),
            );
        }

        match (stack_id, credentials) {
            (Some(stack_id), Some(credentials)) if problems.is_empty() => Ok(Self {
                stack_id,
                layer: cli
                    .layer
                    .clone()
                    .or(file.layer)
                    .unwrap_or_else(|| DEFAULT_LAYER.to_string()),
                region: cli
                    .aws_region
                    .clone()
                    .or(file.aws_region)
                    .unwrap_or_else(|| DEFAULT_REGION.to_string()),
                credentials,
                options,
            }),
            _ => Err(patchkit::Error::Configuration { problems }),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Tests
// ============================================================================
