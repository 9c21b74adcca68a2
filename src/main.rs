mod cli;
mod config;
mod fleet;
mod paths;
mod progress;
mod terminal;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::{FileConfig, RunConfig};
use patchkit::backend::ssh::SshConnector;
use patchkit::{AutoConfirm, Confirm, Orchestrator};
use terminal::{DialoguerConfirm, TerminalReporter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let file = FileConfig::load(cli.config.as_deref())?;
    let config = RunConfig::resolve(&cli, file).map_err(|e| {
        ui::error(e.category().description());
        e
    })?;

    if !cli.quiet {
        ui::header("hotfixer");
        ui::kv("Stack", &config.stack_id);
        ui::kv("Layer", &config.layer);
        ui::kv("Region", &config.region);
        if config.options.rollback {
            ui::kv("Action", "rollback");
        } else {
            ui::kv("Tag", config.options.target());
        }
        ui::kv("Docroot", &config.options.docroot);
        println!();
    }

    let hosts = fleet::discover(&config, cli.quiet)?;

    let connector = SshConnector::new();
    let mut prompt = DialoguerConfirm;
    let mut auto = AutoConfirm;
    let confirm: &mut dyn Confirm = if config.options.auto_confirm {
        &mut auto
    } else {
        &mut prompt
    };
    let mut reporter = TerminalReporter::new(cli.quiet);

    let summary =
        Orchestrator::new(&connector, confirm, &mut reporter).run(&hosts, &config.options)?;

    terminal::print_summary(&summary);
    if !summary.is_success() {
        log::warn!(
            "{} of {} hosts failed",
            summary.failures.len(),
            summary.attempted()
        );
    }
    Ok(())
}
