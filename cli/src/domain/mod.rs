//! Domain layer — pure deployment types and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.

pub mod config;
pub mod error;
pub mod node;
pub mod trust;

pub use config::DeployConfig;
pub use error::{CloudError, ShellError};
pub use node::{MachineSize, Node, NodeId, NodeState, Zone};
pub use trust::{IngressRule, Network, PortRange, Protocol, RuleSource, TrustGroup, TrustGroupId};
