//! Best-effort teardown of every resource carrying the deployment tag.
//!
//! Nodes are terminated first, then trust groups are deleted. Group
//! deletion races against instance shutdown, so contention errors are
//! retried with a fixed delay; "already gone" counts as success. Any other
//! error is fatal for that resource only — cleanup of the remaining
//! resources continues.

use anyhow::{Context, Result};

use crate::application::ports::CloudCompute;
use crate::application::services::retry::{RetryPolicy, cleanup_contention};
use crate::domain::CloudError;

/// What cleanup managed to remove, and what it gave up on.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub nodes_terminated: usize,
    pub groups_deleted: usize,
    pub failed: Vec<String>,
}

impl CleanupReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Tear down all tagged nodes and trust groups.
pub async fn run(cloud: &impl CloudCompute, retry: &RetryPolicy) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();

    let nodes = cloud
        .list_deployed_nodes()
        .await
        .context("listing deployed nodes")?;
    for node in &nodes {
        tracing::info!(node = %node.id, "terminating node");
        match cloud.terminate_node(&node.id).await {
            Ok(()) => report.nodes_terminated += 1,
            Err(err) if already_gone(&err) => {}
            Err(err) => {
                tracing::warn!(node = %node.id, error = %err, "failed to terminate node");
                report.failed.push(format!("node {}: {err}", node.id));
            }
        }
    }

    let groups = cloud
        .list_deployed_groups()
        .await
        .context("listing deployed trust groups")?;
    for group in &groups {
        tracing::info!(group = %group, "deleting trust group");
        let result = retry
            .run(cleanup_contention, || async {
                match cloud.delete_security_group(group).await {
                    Err(err) if already_gone(&err) => Ok(()),
                    other => other,
                }
            })
            .await;
        match result {
            Ok(()) => report.groups_deleted += 1,
            Err(err) => {
                tracing::warn!(group = %group, error = %err, "failed to delete trust group");
                report.failed.push(format!("group {group}: {err}"));
            }
        }
    }

    Ok(report)
}

fn already_gone(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CloudError>().is_some_and(CloudError::is_gone)
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    use anyhow::Result;

    use super::*;
    use crate::application::services::test_support::{impl_cloud_compute_stubs, node};
    use crate::domain::{Node, NodeId, NodeState, TrustGroupId};

    struct TeardownFake {
        nodes: Vec<Node>,
        groups: Vec<TrustGroupId>,
        group_contention_remaining: Cell<u32>,
        terminated: RefCell<Vec<NodeId>>,
        deleted: RefCell<Vec<TrustGroupId>>,
        poison_group: Option<TrustGroupId>,
    }

    impl TeardownFake {
        fn new(nodes: Vec<Node>, groups: Vec<TrustGroupId>) -> Self {
            Self {
                nodes,
                groups,
                group_contention_remaining: Cell::new(0),
                terminated: RefCell::new(Vec::new()),
                deleted: RefCell::new(Vec::new()),
                poison_group: None,
            }
        }
    }

    impl CloudCompute for TeardownFake {
        async fn list_deployed_nodes(&self) -> Result<Vec<Node>> {
            Ok(self.nodes.clone())
        }
        async fn terminate_node(&self, id: &NodeId) -> Result<()> {
            self.terminated.borrow_mut().push(id.clone());
            Ok(())
        }
        async fn list_deployed_groups(&self) -> Result<Vec<TrustGroupId>> {
            Ok(self.groups.clone())
        }
        async fn delete_security_group(&self, id: &TrustGroupId) -> Result<()> {
            if self.poison_group.as_ref() == Some(id) {
                return Err(CloudError::from_code("UnauthorizedOperation", "denied").into());
            }
            let remaining = self.group_contention_remaining.get();
            if remaining > 0 {
                self.group_contention_remaining.set(remaining - 1);
                return Err(CloudError::from_code("DependencyViolation", "still attached").into());
            }
            self.deleted.borrow_mut().push(id.clone());
            Ok(())
        }
        impl_cloud_compute_stubs!(
            default_network,
            available_zones,
            create_security_group,
            authorize_ingress,
            launch_node,
            describe_node,
        );
    }

    fn bounded() -> RetryPolicy {
        RetryPolicy::bounded(Duration::ZERO, 10)
    }

    #[tokio::test]
    async fn terminates_nodes_then_deletes_groups() {
        let fake = TeardownFake::new(
            vec![node("i-1", NodeState::Running), node("i-2", NodeState::Stopped)],
            vec![TrustGroupId("sg-1".into()), TrustGroupId("sg-2".into())],
        );
        let report = run(&fake, &bounded()).await.expect("cleanup");
        assert!(report.is_clean());
        assert_eq!(report.nodes_terminated, 2);
        assert_eq!(report.groups_deleted, 2);
        assert_eq!(fake.terminated.borrow().len(), 2);
        assert_eq!(fake.deleted.borrow().len(), 2);
    }

    #[tokio::test]
    async fn contention_is_retried_until_the_group_frees_up() {
        let fake = TeardownFake::new(Vec::new(), vec![TrustGroupId("sg-busy".into())]);
        fake.group_contention_remaining.set(3);
        let report = run(&fake, &bounded()).await.expect("cleanup");
        assert!(report.is_clean());
        assert_eq!(report.groups_deleted, 1);
    }

    #[tokio::test]
    async fn fatal_group_error_does_not_abort_the_rest() {
        let mut fake = TeardownFake::new(
            Vec::new(),
            vec![TrustGroupId("sg-bad".into()), TrustGroupId("sg-good".into())],
        );
        fake.poison_group = Some(TrustGroupId("sg-bad".into()));
        let report = run(&fake, &bounded()).await.expect("cleanup");
        assert!(!report.is_clean());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.groups_deleted, 1);
        assert_eq!(fake.deleted.borrow()[0], TrustGroupId("sg-good".into()));
    }
}
