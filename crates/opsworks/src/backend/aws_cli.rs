//! Backend that calls the `aws` CLI with JSON output.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{Credentials, DescribeInstances, DescribeLayers, Instance, Layer};
use std::path::PathBuf;
use std::process::Command;

/// Backend that executes real `aws opsworks` commands.
pub struct AwsCliBackend {
    /// Path to the aws executable
    aws_path: PathBuf,
    /// Region passed as `--region`
    region: String,
    credentials: Credentials,
}

impl AwsCliBackend {
    /// Create a new backend.
    ///
    /// Returns an error if the aws CLI is not installed.
    pub fn new(region: impl Into<String>, credentials: Credentials) -> Result<Self> {
        let aws_path = which::which("aws").map_err(|_| Error::AwsCliNotFound)?;
        Ok(Self {
            aws_path,
            region: region.into(),
            credentials,
        })
    }

    /// Arguments shared by every call.
    fn base_args(&self, operation: &str) -> Vec<String> {
        let mut args = vec![
            "opsworks".to_string(),
            operation.to_string(),
            "--region".to_string(),
            self.region.clone(),
            "--output".to_string(),
            "json".to_string(),
        ];
        if let Credentials::Profile(profile) = &self.credentials {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }

    /// Run an aws command and return stdout.
    fn run_aws(&self, args: &[String]) -> Result<String> {
        log::debug!("aws {}", args.join(" "));

        let mut cmd = Command::new(&self.aws_path);
        cmd.args(args);
        if let Credentials::Keys {
            access_key,
            secret_key,
        } = &self.credentials
        {
            cmd.env("AWS_ACCESS_KEY_ID", access_key)
                .env("AWS_SECRET_ACCESS_KEY", secret_key);
        }

        let output = cmd.output().map_err(|e| Error::CommandFailed {
            message: format!("failed to execute aws: {e}"),
            stderr: String::new(),
        })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                message: format!("aws opsworks {} failed", args[1]),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Backend for AwsCliBackend {
    fn describe_layers(&self, stack_id: &str) -> Result<Vec<Layer>> {
        let mut args = self.base_args("describe-layers");
        args.push("--stack-id".to_string());
        args.push(stack_id.to_string());

        let parsed: DescribeLayers = serde_json::from_str(&self.run_aws(&args)?)?;
        Ok(parsed.layers)
    }

    fn describe_instances(&self, layer_id: &str) -> Result<Vec<Instance>> {
        let mut args = self.base_args("describe-instances");
        args.push("--layer-id".to_string());
        args.push(layer_id.to_string());

        let parsed: DescribeInstances = serde_json::from_str(&self.run_aws(&args)?)?;
        Ok(parsed.instances)
    }
}
