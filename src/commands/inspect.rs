// ABOUTME: Config inspection commands: list services and datacenters.
// ABOUTME: Answers from the loaded configuration without contacting the scheduler.

use pitwall::config::DeploymentConfig;
use pitwall::error::{Error, Result};
use pitwall::output::Output;

/// Print every configured service, or only those of `dc`.
pub fn list_services(config: &DeploymentConfig, dc: Option<&str>, output: &Output) -> Result<()> {
    match dc {
        Some(dc) => {
            let datacenter = config
                .datacenter(dc)
                .ok_or_else(|| Error::UnknownDatacenter(dc.to_string()))?;
            for name in datacenter.services.keys() {
                output.item(name.as_str());
            }
        }
        None => {
            for name in config.service_names() {
                output.item(name);
            }
        }
    }
    Ok(())
}

/// Print the datacenters `service` is configured in, marking federated ones.
pub fn list_datacenters(config: &DeploymentConfig, service: &str, output: &Output) {
    for dc in config.find_datacenters(service) {
        if config.is_federated(dc) {
            output.item(&format!("{dc} (federated)"));
        } else {
            output.item(dc);
        }
    }
}
