//! Compute provisioning: node allocation and readiness waits.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::CloudCompute;
use crate::domain::{MachineSize, Node, TrustGroupId};

/// One node to allocate: the trust groups to attach and the machine size.
#[derive(Debug, Clone)]
pub struct NodeRequest {
    pub groups: Vec<TrustGroupId>,
    pub size: MachineSize,
}

impl NodeRequest {
    #[must_use]
    pub fn new(group: &TrustGroupId, size: MachineSize) -> Self {
        Self {
            groups: vec![group.clone()],
            size,
        }
    }
}

/// Allocate one node per request, assigning availability zones round-robin
/// to spread fault domains.
///
/// Platform errors (capacity exhaustion, quota) propagate verbatim —
/// retrying an allocation is the orchestrator's policy decision, and its
/// policy is to abort the run.
pub async fn launch_nodes(
    cloud: &impl CloudCompute,
    requests: &[NodeRequest],
) -> Result<Vec<Node>> {
    let zones = cloud
        .available_zones()
        .await
        .context("listing availability zones")?;
    anyhow::ensure!(!zones.is_empty(), "platform reported no availability zones");

    tracing::info!(count = requests.len(), "launching nodes");
    let mut nodes = Vec::with_capacity(requests.len());
    for (i, request) in requests.iter().enumerate() {
        let zone = &zones[i % zones.len()];
        let node = cloud.launch_node(&request.groups, request.size, zone).await?;
        tracing::info!(node = %node.id, zone = %zone.0, "node launched");
        nodes.push(node);
    }
    Ok(nodes)
}

/// Block until `node` reports running and has a public address, then return
/// the fresh observation. Suspends between polls rather than busy-looping,
/// so sibling waits in the same stage make progress concurrently.
///
/// # Errors
///
/// Fails if the node reaches a terminal state (stopped, terminated) before
/// ever becoming reachable.
pub async fn wait_ready(
    cloud: &impl CloudCompute,
    node: &Node,
    poll_interval: Duration,
) -> Result<Node> {
    loop {
        let observed = cloud.describe_node(&node.id).await?;
        if observed.is_ready() {
            tracing::debug!(node = %observed.id, "node ready");
            return Ok(observed);
        }
        anyhow::ensure!(
            !observed.state.is_terminal(),
            "node {} reached state {:?} before becoming reachable",
            observed.id,
            observed.state
        );
        tokio::time::sleep(poll_interval).await;
    }
}
