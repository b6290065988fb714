//! Compute node types, as observed from the cloud platform.
//!
//! A [`Node`] is created once by the provisioner and then only re-observed:
//! state transitions are driven by the platform, never by this process.

use std::fmt;

/// Platform-assigned node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Running,
    Stopped,
    Terminated,
}

impl NodeState {
    /// Map a platform state name onto the coarse lifecycle this system
    /// cares about. Transitional shutdown states collapse into their
    /// destination state.
    #[must_use]
    pub fn from_platform(name: &str) -> Option<Self> {
        match name {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "stopping" | "stopped" => Some(Self::Stopped),
            "shutting-down" | "terminated" => Some(Self::Terminated),
            _ => None,
        }
    }

    /// True for states a node can never leave on its own.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Terminated)
    }
}

/// Availability zone name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone(pub String);

/// Machine sizing for a launch request. Database nodes run small; the
/// proxy/trusted/gatekeeper tiers run large.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineSize {
    Micro,
    Large,
}

impl MachineSize {
    #[must_use]
    pub fn instance_type(self) -> &'static str {
        match self {
            Self::Micro => "t2.micro",
            Self::Large => "t2.large",
        }
    }
}

/// One allocated compute node.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Assigned by the platform some time after launch; absent until then.
    pub public_address: Option<String>,
    pub private_address: String,
    pub zone: Zone,
    pub state: NodeState,
}

impl Node {
    /// True once the node is reachable: running with a public address.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == NodeState::Running && self.public_address.is_some()
    }
}
