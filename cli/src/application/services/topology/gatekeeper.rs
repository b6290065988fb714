//! Secured cluster topology — the gatekeeper pattern.
//!
//! Builds the cluster, then layers three tiers that form a point-to-point
//! access chain: public → gatekeeper → trusted host → proxy → cluster. Only
//! the gatekeeper is reachable from the open internet; each inner tier
//! accepts traffic solely from the tier in front of it.

use anyhow::{Context, Result};
use serde_json::json;

use crate::application::ports::{CloudCompute, RemoteShell, RenderContext, TemplateEngine};
use crate::application::services::compute::{self, NodeRequest};
use crate::application::services::provision::ProvisioningTask;
use crate::application::services::retry::RetryPolicies;
use crate::application::services::topology::cluster::{self, ClusterDeployment};
use crate::application::services::topology::{
    GATEKEEPER_PORT, MYSQL_PORT, PROXY_PORT, TRUSTED_HOST_PORT,
};
use crate::application::services::trust;
use crate::domain::{DeployConfig, IngressRule, MachineSize, Network, Node, RuleSource, TrustGroup};

pub struct GatekeeperDeployment {
    pub cluster: ClusterDeployment,
    pub proxy: Node,
    pub trusted_host: Node,
    pub gatekeeper: Node,
}

/// Deploy the full secured cluster.
pub async fn deploy(
    cloud: &impl CloudCompute,
    shell: &impl RemoteShell,
    templates: &impl TemplateEngine,
    cfg: &DeployConfig,
) -> Result<GatekeeperDeployment> {
    let retry = RetryPolicies::from_config(cfg);
    let network = cloud
        .default_network()
        .await
        .context("resolving default network")?;

    let mut cluster = cluster::build(cloud, shell, templates, cfg, &network).await?;

    // Proxy tier: permitted to reach the cluster's database port.
    tracing::info!("setting up proxy tier");
    let (proxy, mut proxy_group) = launch_tier(cloud, cfg, &network).await?;
    trust::add_rule(
        cloud,
        &mut cluster.group,
        IngressRule::tcp(MYSQL_PORT, RuleSource::host(&proxy.private_address)),
    )
    .await?;
    let workers: Vec<&str> = cluster
        .workers
        .iter()
        .map(|w| w.private_address.as_str())
        .collect();
    let proxy_config = json!({
        "coordinator": cluster.coordinator.private_address,
        "workers": workers,
        "username": "root",
        "password": cfg.db_root_password,
        "database": "sakila",
    });
    deploy_tier_app(shell, templates, &retry, &proxy, "proxy.ts", &proxy_config).await?;

    // Trusted-host tier: permitted to reach the proxy.
    tracing::info!("setting up trusted host tier");
    let (trusted_host, mut trusted_group) = launch_tier(cloud, cfg, &network).await?;
    trust::add_rule(
        cloud,
        &mut proxy_group,
        IngressRule::tcp(PROXY_PORT, RuleSource::host(&trusted_host.private_address)),
    )
    .await?;
    let trusted_config = json!({
        "proxy": format!("http://{}:{PROXY_PORT}", proxy.private_address),
    });
    deploy_tier_app(shell, templates, &retry, &trusted_host, "trusted.ts", &trusted_config).await?;

    // Gatekeeper tier: permitted to reach the trusted host, exposed publicly.
    tracing::info!("setting up gatekeeper tier");
    let (gatekeeper, mut gatekeeper_group) = launch_tier(cloud, cfg, &network).await?;
    trust::add_rule(
        cloud,
        &mut trusted_group,
        IngressRule::tcp(
            TRUSTED_HOST_PORT,
            RuleSource::host(&gatekeeper.private_address),
        ),
    )
    .await?;
    let gatekeeper_config = json!({
        "trusted": format!("http://{}:{TRUSTED_HOST_PORT}", trusted_host.private_address),
    });
    deploy_tier_app(
        shell,
        templates,
        &retry,
        &gatekeeper,
        "gatekeeper.ts",
        &gatekeeper_config,
    )
    .await?;
    trust::add_rule(
        cloud,
        &mut gatekeeper_group,
        IngressRule::tcp(GATEKEEPER_PORT, RuleSource::anywhere()),
    )
    .await?;

    tracing::info!(
        gatekeeper = gatekeeper.public_address.as_deref().unwrap_or("-"),
        trusted_host = trusted_host.public_address.as_deref().unwrap_or("-"),
        proxy = proxy.public_address.as_deref().unwrap_or("-"),
        "secured cluster ready"
    );
    Ok(GatekeeperDeployment {
        cluster,
        proxy,
        trusted_host,
        gatekeeper,
    })
}

/// Open a tier's trust group and bring up its single large node.
async fn launch_tier(
    cloud: &impl CloudCompute,
    cfg: &DeployConfig,
    network: &Network,
) -> Result<(Node, TrustGroup)> {
    let group = trust::open_group(cloud, network, &[]).await?;
    let launched =
        compute::launch_nodes(cloud, &[NodeRequest::new(&group.id, MachineSize::Large)]).await?;
    let node = compute::wait_ready(cloud, &launched[0], cfg.poll_interval).await?;
    Ok((node, group))
}

/// Render the tier deployment script around the embedded application
/// payload and its JSON configuration, then run it on the tier node.
async fn deploy_tier_app(
    shell: &impl RemoteShell,
    templates: &impl TemplateEngine,
    retry: &RetryPolicies,
    node: &Node,
    app_asset: &str,
    config: &serde_json::Value,
) -> Result<()> {
    let ctx = RenderContext::new()
        .with("app_source", templates.raw(app_asset)?)
        .with("config_json", config.to_string());
    let task = ProvisioningTask::new(templates.render("pattern_deploy.sh", &ctx)?);
    task.apply(shell, node, retry).await
}
