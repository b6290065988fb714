//! Network trust controller: boundary groups and ingress rule appends.
//!
//! Deliberately minimal primitives. The topology orchestrator composes them
//! into differently shaped trust graphs: a full mesh for the cluster, a
//! point-to-point chain for the gatekeeper pattern. No deletion, no
//! deduplication — each rule is issued exactly once per run.

use anyhow::{Context, Result};

use crate::application::ports::CloudCompute;
use crate::domain::{IngressRule, Network, RuleSource, TrustGroup};

/// Secure-shell access is granted from anywhere on every group. A lab
/// simplification kept on purpose; tightening it is a policy change, not a
/// code fix.
const SSH_PORT: u16 = 22;

/// Create a trust group scoped to `network`, seeded with the administrative
/// rules (diagnostic ICMP from the local network, ssh from anywhere)
/// followed by `base_rules`, in that order.
pub async fn open_group(
    cloud: &impl CloudCompute,
    network: &Network,
    base_rules: &[IngressRule],
) -> Result<TrustGroup> {
    let id = cloud
        .create_security_group(network)
        .await
        .context("creating trust group")?;
    tracing::info!(group = %id, "trust group created");

    let mut rules = vec![
        IngressRule::icmp(RuleSource::network(network.cidr.clone())),
        IngressRule::tcp(SSH_PORT, RuleSource::anywhere()),
    ];
    rules.extend_from_slice(base_rules);
    cloud
        .authorize_ingress(&id, &rules)
        .await
        .context("seeding trust group rules")?;

    Ok(TrustGroup { id, rules })
}

/// Append one ingress rule to an existing group.
///
/// The group's rule list is only ever appended to across stages, already
/// serialized by the stage join barrier — never from within a stage.
pub async fn add_rule(
    cloud: &impl CloudCompute,
    group: &mut TrustGroup,
    rule: IngressRule,
) -> Result<()> {
    cloud
        .authorize_ingress(&group.id, std::slice::from_ref(&rule))
        .await
        .with_context(|| format!("adding ingress rule to {}", group.id))?;
    group.rules.push(rule);
    Ok(())
}
