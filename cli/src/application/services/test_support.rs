//! Shared test helpers for application service tests.
//!
//! Provides node builders and a macro to generate `CloudCompute` stub
//! methods that bail with "not expected".

use crate::domain::{Node, NodeId, NodeState, Zone};

/// Build an `ExitStatus` from a logical exit code (cross-platform).
#[cfg(unix)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    std::process::ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> std::process::Output {
    std::process::Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn fail_output(code: i32, stderr: &[u8]) -> std::process::Output {
    std::process::Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

/// Build a node in the given state, without a public address.
pub fn node(id: &str, state: NodeState) -> Node {
    Node {
        id: NodeId(id.to_owned()),
        public_address: None,
        private_address: format!("10.0.0.{}", id.len()),
        zone: Zone("us-east-1a".to_owned()),
        state,
    }
}

/// Build a ready node: running, with public and private addresses derived
/// from `octet`.
pub fn ready_node(id: &str, octet: u8) -> Node {
    Node {
        id: NodeId(id.to_owned()),
        public_address: Some(format!("52.0.0.{octet}")),
        private_address: format!("10.0.0.{octet}"),
        zone: Zone("us-east-1a".to_owned()),
        state: NodeState::Running,
    }
}

/// Generate `CloudCompute` stub methods that bail with "not expected".
///
/// Usage: `impl_cloud_compute_stubs!(default_network, launch_node, ...);`
/// Omit any method you implement yourself.
macro_rules! impl_cloud_compute_stubs {
    ($($method:ident),* $(,)?) => {
        $(impl_cloud_compute_stubs!(@one $method);)*
    };
    (@one default_network) => {
        async fn default_network(&self) -> anyhow::Result<crate::domain::Network> {
            anyhow::bail!("not expected")
        }
    };
    (@one available_zones) => {
        async fn available_zones(&self) -> anyhow::Result<Vec<crate::domain::Zone>> {
            anyhow::bail!("not expected")
        }
    };
    (@one create_security_group) => {
        async fn create_security_group(
            &self,
            _: &crate::domain::Network,
        ) -> anyhow::Result<crate::domain::TrustGroupId> {
            anyhow::bail!("not expected")
        }
    };
    (@one authorize_ingress) => {
        async fn authorize_ingress(
            &self,
            _: &crate::domain::TrustGroupId,
            _: &[crate::domain::IngressRule],
        ) -> anyhow::Result<()> {
            anyhow::bail!("not expected")
        }
    };
    (@one launch_node) => {
        async fn launch_node(
            &self,
            _: &[crate::domain::TrustGroupId],
            _: crate::domain::MachineSize,
            _: &crate::domain::Zone,
        ) -> anyhow::Result<crate::domain::Node> {
            anyhow::bail!("not expected")
        }
    };
    (@one describe_node) => {
        async fn describe_node(
            &self,
            _: &crate::domain::NodeId,
        ) -> anyhow::Result<crate::domain::Node> {
            anyhow::bail!("not expected")
        }
    };
    (@one list_deployed_nodes) => {
        async fn list_deployed_nodes(&self) -> anyhow::Result<Vec<crate::domain::Node>> {
            anyhow::bail!("not expected")
        }
    };
    (@one terminate_node) => {
        async fn terminate_node(&self, _: &crate::domain::NodeId) -> anyhow::Result<()> {
            anyhow::bail!("not expected")
        }
    };
    (@one list_deployed_groups) => {
        async fn list_deployed_groups(
            &self,
        ) -> anyhow::Result<Vec<crate::domain::TrustGroupId>> {
            anyhow::bail!("not expected")
        }
    };
    (@one delete_security_group) => {
        async fn delete_security_group(&self, _: &crate::domain::TrustGroupId) -> anyhow::Result<()> {
            anyhow::bail!("not expected")
        }
    };
}

pub(crate) use impl_cloud_compute_stubs;
