//! Layer lookup through OpsWorks.

use crate::config::RunConfig;
use crate::{progress, ui};
use anyhow::{Context, Result};
use opsworks::{Client, Instance};
use patchkit::HostRecord;

/// Resolve the configured layer to host records, in OpsWorks order.
pub fn discover(config: &RunConfig, quiet: bool) -> Result<Vec<HostRecord>> {
    let client = Client::new(&config.region, config.credentials.clone())
        .context("Could not set up the OpsWorks client")?;
    discover_with(&client, config, quiet)
}

pub fn discover_with(client: &Client, config: &RunConfig, quiet: bool) -> Result<Vec<HostRecord>> {
    let pb = if quiet {
        progress::hidden()
    } else {
        progress::spinner(&format!("Loading {} instances...", config.layer))
    };

    let instances = match client.instances_in_layer(&config.stack_id, &config.layer) {
        Ok(instances) => instances,
        Err(e) => {
            progress::finish_clear(&pb);
            return Err(e).with_context(|| {
                format!(
                    "Could not load layer {} of stack {}",
                    config.layer, config.stack_id
                )
            });
        }
    };

    let hosts: Vec<HostRecord> = instances.into_iter().map(to_host).collect();
    if quiet {
        progress::finish_clear(&pb);
    } else {
        progress::finish_success(
            &pb,
            &format!(
                "Found {} in layer {}",
                ui::plural(hosts.len(), "instance"),
                config.layer
            ),
        );
    }
    Ok(hosts)
}

fn to_host(instance: Instance) -> HostRecord {
    HostRecord::new(instance.hostname, instance.public_ip, instance.status)
}
