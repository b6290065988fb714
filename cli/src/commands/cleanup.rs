//! Teardown of every tagged resource.

use anyhow::{Result, ensure};

use crate::application::services::cleanup;
use crate::application::services::retry::RetryPolicy;
use crate::domain::DeployConfig;
use crate::infra::ec2::AwsCliCompute;

pub async fn run(cfg: &DeployConfig) -> Result<()> {
    let cloud = AwsCliCompute::default_runner(cfg);
    let retry = match cfg.retry_limit {
        Some(limit) => RetryPolicy::bounded(cfg.retry_delay, limit),
        None => RetryPolicy::fixed(cfg.retry_delay),
    };
    let report = cleanup::run(&cloud, &retry).await?;
    tracing::info!(
        nodes = report.nodes_terminated,
        groups = report.groups_deleted,
        "cleanup finished"
    );
    ensure!(
        report.is_clean(),
        "cleanup left {} resource(s) behind",
        report.failed.len()
    );
    Ok(())
}
