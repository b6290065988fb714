//! Topology deployment handlers.

use anyhow::Result;

use crate::application::services::topology::{cluster, gatekeeper, standalone};
use crate::domain::{DeployConfig, Node};
use crate::infra::ec2::AwsCliCompute;
use crate::infra::ssh::OpenSshShell;
use crate::infra::templates::EmbeddedTemplates;

pub async fn standalone(cfg: &DeployConfig) -> Result<()> {
    let cloud = AwsCliCompute::default_runner(cfg);
    let shell = OpenSshShell::default_runner(cfg);
    let deployment = standalone::deploy(&cloud, &shell, &EmbeddedTemplates, cfg).await?;
    tracing::info!(
        address = address_of(&deployment.node),
        "standalone deployment complete"
    );
    Ok(())
}

pub async fn cluster(cfg: &DeployConfig) -> Result<()> {
    let cloud = AwsCliCompute::default_runner(cfg);
    let shell = OpenSshShell::default_runner(cfg);
    let deployment = cluster::deploy(&cloud, &shell, &EmbeddedTemplates, cfg).await?;
    tracing::info!(
        coordinator = address_of(&deployment.coordinator),
        workers = deployment.workers.len(),
        "cluster deployment complete"
    );
    Ok(())
}

pub async fn gatekeeper(cfg: &DeployConfig) -> Result<()> {
    let cloud = AwsCliCompute::default_runner(cfg);
    let shell = OpenSshShell::default_runner(cfg);
    let deployment = gatekeeper::deploy(&cloud, &shell, &EmbeddedTemplates, cfg).await?;
    tracing::info!(
        gatekeeper = address_of(&deployment.gatekeeper),
        "gatekeeper deployment complete; send queries to port 3000"
    );
    Ok(())
}

fn address_of(node: &Node) -> &str {
    node.public_address.as_deref().unwrap_or("-")
}
