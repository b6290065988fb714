//! Standalone topology: one trust group, one node, three ordered
//! provisioning tasks.

use anyhow::{Context, Result};

use crate::application::ports::{CloudCompute, RemoteShell, RenderContext, TemplateEngine};
use crate::application::services::compute::{self, NodeRequest};
use crate::application::services::provision::ProvisioningTask;
use crate::application::services::retry::RetryPolicies;
use crate::application::services::topology::MYSQL_PORT;
use crate::application::services::trust;
use crate::domain::{DeployConfig, IngressRule, MachineSize, Node, RuleSource, TrustGroup};

pub struct StandaloneDeployment {
    pub node: Node,
    pub group: TrustGroup,
}

/// Deploy a single database node with its port open to the world.
///
/// Stages: trust group → node launch + readiness → install server → rotate
/// root credentials → load the seed dataset.
pub async fn deploy(
    cloud: &impl CloudCompute,
    shell: &impl RemoteShell,
    templates: &impl TemplateEngine,
    cfg: &DeployConfig,
) -> Result<StandaloneDeployment> {
    let retry = RetryPolicies::from_config(cfg);
    let network = cloud
        .default_network()
        .await
        .context("resolving default network")?;

    let group = trust::open_group(
        cloud,
        &network,
        &[IngressRule::tcp(MYSQL_PORT, RuleSource::anywhere())],
    )
    .await?;

    let launched =
        compute::launch_nodes(cloud, &[NodeRequest::new(&group.id, MachineSize::Micro)]).await?;
    let node = compute::wait_ready(cloud, &launched[0], cfg.poll_interval).await?;

    let steps = [
        ("install_mysql.sh", RenderContext::new()),
        (
            "mysql_root_setup.sh",
            RenderContext::new().with("root_password", cfg.db_root_password.as_str()),
        ),
        (
            "load_sakila.sh",
            RenderContext::new().with("root_password", cfg.db_root_password.as_str()),
        ),
    ];
    for (template, ctx) in steps {
        let task = ProvisioningTask::new(templates.render(template, &ctx)?);
        task.apply(shell, &node, &retry).await?;
    }

    tracing::info!(
        address = node.public_address.as_deref().unwrap_or("-"),
        "standalone database ready"
    );
    Ok(StandaloneDeployment { node, group })
}
