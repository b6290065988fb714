//! Replicated cluster topology: four nodes, a full east-west trust mesh,
//! one coordinator and three workers.

use anyhow::{Context, Result};
use futures::future::try_join_all;

use crate::application::ports::{CloudCompute, RemoteShell, RenderContext, TemplateEngine};
use crate::application::services::compute::{self, NodeRequest};
use crate::application::services::provision::ProvisioningTask;
use crate::application::services::retry::RetryPolicies;
use crate::application::services::topology::MYSQL_PORT;
use crate::application::services::trust;
use crate::domain::{
    DeployConfig, IngressRule, MachineSize, Network, Node, RuleSource, TrustGroup,
};

/// Fixed cluster size: one coordinator plus three workers.
pub const CLUSTER_SIZE: usize = 4;

#[derive(Debug)]
pub struct ClusterDeployment {
    pub coordinator: Node,
    pub workers: Vec<Node>,
    pub group: TrustGroup,
}

/// Deploy a cluster with its database port open to the world.
pub async fn deploy(
    cloud: &impl CloudCompute,
    shell: &impl RemoteShell,
    templates: &impl TemplateEngine,
    cfg: &DeployConfig,
) -> Result<ClusterDeployment> {
    let network = cloud
        .default_network()
        .await
        .context("resolving default network")?;
    let mut cluster = build(cloud, shell, templates, cfg, &network).await?;

    trust::add_rule(
        cloud,
        &mut cluster.group,
        IngressRule::tcp(MYSQL_PORT, RuleSource::anywhere()),
    )
    .await?;

    tracing::info!(
        coordinator = cluster.coordinator.public_address.as_deref().unwrap_or("-"),
        "cluster ready"
    );
    Ok(cluster)
}

/// Build the cluster stages without exposing the database port publicly.
/// The gatekeeper pattern reuses this as its first sub-pipeline.
pub async fn build(
    cloud: &impl CloudCompute,
    shell: &impl RemoteShell,
    templates: &impl TemplateEngine,
    cfg: &DeployConfig,
    network: &Network,
) -> Result<ClusterDeployment> {
    let retry = RetryPolicies::from_config(cfg);
    let mut group = trust::open_group(cloud, network, &[]).await?;

    // Stage: launch all four nodes, then wait for each concurrently.
    let requests = vec![NodeRequest::new(&group.id, MachineSize::Micro); CLUSTER_SIZE];
    let launched = compute::launch_nodes(cloud, &requests).await?;
    let nodes = try_join_all(
        launched
            .iter()
            .map(|node| compute::wait_ready(cloud, node, cfg.poll_interval)),
    )
    .await?;

    // Stage: full mesh — every node may reach every other on any port.
    for node in &nodes {
        trust::add_rule(
            cloud,
            &mut group,
            IngressRule::all(RuleSource::host(&node.private_address)),
        )
        .await?;
    }

    // Stage: management packages on every node concurrently.
    tracing::info!("installing management packages on all nodes");
    let mgmt_script = templates.render(
        "mysql_apt_config.sh",
        &RenderContext::new().with("server", "mysql-cluster-8.0"),
    )?;
    try_join_all(nodes.iter().map(|node| {
        let task = ProvisioningTask::new(mgmt_script.clone());
        async move { task.apply(shell, node, &retry).await }
    }))
    .await?;

    let coordinator = nodes[0].clone();
    let workers: Vec<Node> = nodes[1..].to_vec();

    // Stage: coordinator role on the designated first node.
    tracing::info!(node = %coordinator.id, "configuring coordinator");
    let worker_ips: Vec<&str> = workers.iter().map(|w| w.private_address.as_str()).collect();
    let coordinator_ctx = RenderContext::new()
        .with("coordinator_private_ip", coordinator.private_address.as_str())
        .with("worker_private_ips", worker_ips.join(" "));
    ProvisioningTask::new(templates.render("cluster_mgmd.sh", &coordinator_ctx)?)
        .apply(shell, &coordinator, &retry)
        .await?;

    // Stage: worker role on the remaining nodes concurrently.
    tracing::info!("configuring workers");
    let worker_script = templates.render(
        "cluster_ndbd.sh",
        &RenderContext::new().with("coordinator_private_ip", coordinator.private_address.as_str()),
    )?;
    try_join_all(workers.iter().map(|worker| {
        let task = ProvisioningTask::new(worker_script.clone());
        async move { task.apply(shell, worker, &retry).await }
    }))
    .await?;

    // Stage: database server on every node concurrently; each node runs its
    // three sub-steps in order.
    tracing::info!("installing database server on all nodes");
    try_join_all(
        nodes
            .iter()
            .map(|node| install_database(shell, templates, cfg, &retry, node, &coordinator)),
    )
    .await?;

    tracing::info!(coordinator = %coordinator.id, workers = workers.len(), "cluster built");
    Ok(ClusterDeployment {
        coordinator,
        workers,
        group,
    })
}

/// Per-node install sequence: cluster-compatible server, root credentials,
/// seed dataset. The seed data's storage engine does not replicate across
/// the cluster, so it is loaded on every node.
async fn install_database(
    shell: &impl RemoteShell,
    templates: &impl TemplateEngine,
    cfg: &DeployConfig,
    retry: &RetryPolicies,
    node: &Node,
    coordinator: &Node,
) -> Result<()> {
    let server_ctx = RenderContext::new()
        .with("coordinator_private_ip", coordinator.private_address.as_str());
    ProvisioningTask::new(templates.render("cluster_mysql.sh", &server_ctx)?)
        .apply(shell, node, retry)
        .await?;

    let credentials_ctx =
        RenderContext::new().with("root_password", cfg.db_root_password.as_str());
    ProvisioningTask::new(templates.render("mysql_root_setup.sh", &credentials_ctx)?)
        .apply(shell, node, retry)
        .await?;

    let seed_ctx = RenderContext::new().with("root_password", cfg.db_root_password.as_str());
    ProvisioningTask::new(templates.render("load_sakila.sh", &seed_ctx)?)
        .apply(shell, node, retry)
        .await
}
