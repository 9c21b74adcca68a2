use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "hotfixer")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Apply or roll back git tag hotfixes across an OpsWorks layer over SSH",
    long_about = None
)]
pub struct Cli {
    /// OpsWorks stack id
    #[arg(short, long)]
    pub stack_id: Option<String>,

    /// Tag (e.g. 1.2.3) of the hotfix release
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Short name of the layer containing the instances to hotfix [default: rails-app]
    #[arg(short, long)]
    pub layer: Option<String>,

    /// Only hotfix these instances within the layer (comma-separated hostnames)
    #[arg(long, value_delimiter = ',')]
    pub instance: Vec<String>,

    /// SSH username
    #[arg(short, long)]
    pub user: Option<String>,

    /// SSH identity file
    #[arg(short, long)]
    pub identity: Option<PathBuf>,

    /// Remote user that owns the deployment [default: deploy]
    #[arg(short = 'y', long)]
    pub deploy_user: Option<String>,

    /// Run remote commands as the SSH user instead of a deploy user
    #[arg(long, conflicts_with = "deploy_user")]
    pub no_deploy_user: bool,

    /// Use sudo for remote deployment commands [default: true]
    #[arg(short = 'm', long, value_name = "BOOL")]
    pub sudo: Option<bool>,

    /// Command to restart the remote application [default: touch tmp/restart.txt]
    #[arg(short = 'z', long)]
    pub restart_cmd: Option<String>,

    /// AWS access key
    #[arg(short = 'k', long, env = "AWS_ACCESS_KEY", hide_env_values = true)]
    pub aws_key: Option<String>,

    /// AWS secret key
    #[arg(short = 'x', long, env = "AWS_SECRET_KEY", hide_env_values = true)]
    pub aws_secret: Option<String>,

    /// AWS region to connect to [default: us-east-1]
    #[arg(short = 'r', long)]
    pub aws_region: Option<String>,

    /// Connect to the AWS API using a profile from the AWS config
    #[arg(short = 'p', long)]
    pub aws_profile: Option<String>,

    /// Short name of the project app
    #[arg(short, long)]
    pub appname: Option<String>,

    /// Remote project document root [default: /srv/www/<project>/current]
    #[arg(short, long)]
    pub docroot: Option<String>,

    /// Reset the remote codebase before applying the patch
    #[arg(long)]
    pub reset: bool,

    /// Roll back a previously applied patch
    #[arg(long)]
    pub rollback: bool,

    /// Assume yes to all queries and do not prompt
    #[arg(long)]
    pub yes: bool,

    /// Config file [default: ~/.config/hotfixer/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
