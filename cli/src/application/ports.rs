//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`
//! or `crate::commands`.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::domain::{IngressRule, MachineSize, Network, Node, NodeId, TrustGroupId, Zone};

// ── Cloud compute capability ──────────────────────────────────────────────────

/// Narrow view of the cloud platform. The orchestrator depends only on these
/// operations, never on a provider-specific detail. The deployment tag is
/// adapter configuration, not a per-call argument.
#[allow(async_fn_in_trait)]
pub trait CloudCompute {
    /// The network deployments are scoped to (default VPC).
    async fn default_network(&self) -> Result<Network>;
    /// Availability zones usable for node placement.
    async fn available_zones(&self) -> Result<Vec<Zone>>;
    /// Create a tagged trust group scoped to `network`, with no rules yet.
    async fn create_security_group(&self, network: &Network) -> Result<TrustGroupId>;
    /// Append ingress rules to a group. No deduplication.
    async fn authorize_ingress(&self, group: &TrustGroupId, rules: &[IngressRule]) -> Result<()>;
    /// Launch one tagged node in `zone`, attached to `groups`.
    async fn launch_node(
        &self,
        groups: &[TrustGroupId],
        size: MachineSize,
        zone: &Zone,
    ) -> Result<Node>;
    /// Re-observe a node's current state and addresses.
    async fn describe_node(&self, id: &NodeId) -> Result<Node>;

    // Cleanup surface.

    /// Nodes carrying the deployment tag that are not yet terminated.
    async fn list_deployed_nodes(&self) -> Result<Vec<Node>>;
    async fn terminate_node(&self, id: &NodeId) -> Result<()>;
    /// Trust groups carrying the deployment tag.
    async fn list_deployed_groups(&self) -> Result<Vec<TrustGroupId>>;
    async fn delete_security_group(&self, id: &TrustGroupId) -> Result<()>;
}

// ── Remote shell capability ───────────────────────────────────────────────────

/// Opens authenticated shell sessions. Credentials (username, identity file)
/// are adapter construction state.
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    type Session: ShellSession;

    /// Establish a session to `address`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ShellError::Connect`] while the node is not
    /// yet accepting connections; the caller's connect-retry layer absorbs
    /// those.
    async fn connect(&self, address: &str) -> Result<Self::Session>;
}

/// One established session against one node.
#[allow(async_fn_in_trait)]
pub trait ShellSession {
    /// Write `bytes` to `remote_path` on the node.
    async fn upload(&self, bytes: &[u8], remote_path: &str) -> Result<()>;
    /// Run `command`, failing with [`crate::domain::ShellError::Exec`] on a
    /// non-zero exit status.
    async fn exec(&self, command: &str) -> Result<()>;
}

// ── Templating capability ─────────────────────────────────────────────────────

/// Key/value substitution context, passed by value into every render — no
/// process-wide templating state.
#[derive(Debug, Clone, Default)]
pub struct RenderContext(BTreeMap<String, String>);

impl RenderContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Pure text substitution over named templates; deterministic for identical
/// inputs, no control flow.
pub trait TemplateEngine {
    /// Render the named template against `ctx`.
    fn render(&self, name: &str, ctx: &RenderContext) -> Result<String>;
    /// Fetch an opaque payload asset (tier application source) verbatim.
    fn raw(&self, name: &str) -> Result<&str>;
}
