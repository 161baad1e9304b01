// ABOUTME: Deploy command implementation.
// ABOUTME: Builds DeployOptions, runs the Deployer, and cancels it on Ctrl-C.

use pitwall::config::DeploymentConfig;
use pitwall::deploy::{DeployOptions, Deployer};
use pitwall::error::{Error, Result};
use pitwall::nomad::NomadConnector;
use pitwall::output::Output;
use pitwall::types::{ImageRef, ServiceName};
use std::path::Path;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Validate raw CLI values into deploy options.
pub fn deploy_options(
    root: &Path,
    service: &str,
    dc: &str,
    image: &str,
    address: &str,
) -> Result<DeployOptions> {
    let service =
        ServiceName::new(service).map_err(|e| Error::InvalidArgument(format!("service: {e}")))?;
    let image = ImageRef::parse(image).map_err(|e| Error::InvalidArgument(format!("image: {e}")))?;

    Ok(DeployOptions {
        root: root.to_path_buf(),
        dc: dc.to_string(),
        service,
        image,
        address: address.to_string(),
    })
}

/// Deploy one service to one datacenter.
pub async fn deploy(config: &DeploymentConfig, options: DeployOptions, output: &Output) -> Result<()> {
    let datacenter = config
        .datacenter(&options.dc)
        .ok_or_else(|| Error::UnknownDatacenter(options.dc.clone()))?;

    output.progress(&format!(
        "Deploying {} ({}) to {}",
        options.service, options.image, options.dc
    ));

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn(cancel_on_interrupt(cancel.clone()));

    let mut deployer = Deployer::new(options, datacenter, NomadConnector).with_cancellation(cancel);
    let result = deployer.run_with(|stage| output.stage(stage)).await;
    interrupt.abort();

    let summary = result?;
    output.deployed(&summary);
    Ok(())
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            tracing::warn!("interrupted, stopping deployment");
            cancel.cancel();
        }
        Err(e) => tracing::error!(error = %e, "failed to install Ctrl+C handler"),
    }
}
