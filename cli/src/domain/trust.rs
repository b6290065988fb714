//! Network trust boundaries: groups and ingress rules.
//!
//! A [`TrustGroup`] is an append-only set of ingress rules. Rules are added
//! exactly once per deployment run; nothing here deduplicates or deletes.

use std::fmt;

/// The network a deployment is scoped to (default VPC in practice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub cidr: String,
}

/// Platform-assigned trust group identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrustGroupId(pub String);

impl fmt::Display for TrustGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One network boundary plus the rules appended to it during this run.
#[derive(Debug, Clone)]
pub struct TrustGroup {
    pub id: TrustGroupId,
    pub rules: Vec<IngressRule>,
}

/// Ingress traffic source, expressed as a CIDR block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSource(String);

impl RuleSource {
    /// The open internet.
    #[must_use]
    pub fn anywhere() -> Self {
        Self("0.0.0.0/0".into())
    }

    /// A whole network by CIDR block.
    #[must_use]
    pub fn network(cidr: impl Into<String>) -> Self {
        Self(cidr.into())
    }

    /// A single host by private address.
    #[must_use]
    pub fn host(private_address: &str) -> Self {
        Self(format!("{private_address}/32"))
    }

    #[must_use]
    pub fn cidr(&self) -> &str {
        &self.0
    }
}

/// Wire protocol selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Icmp,
    All,
}

impl Protocol {
    /// Platform wire name (`-1` means every protocol).
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Icmp => "icmp",
            Self::All => "-1",
        }
    }
}

/// Inclusive port range; `ALL` (`-1..-1`) matches every port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub from: i64,
    pub to: i64,
}

impl PortRange {
    pub const ALL: Self = Self { from: -1, to: -1 };

    #[must_use]
    pub fn single(port: u16) -> Self {
        Self {
            from: i64::from(port),
            to: i64::from(port),
        }
    }
}

/// One ingress rule: (source, port range, protocol).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    pub source: RuleSource,
    pub ports: PortRange,
    pub protocol: Protocol,
}

impl IngressRule {
    /// TCP on a single port from the given source.
    #[must_use]
    pub fn tcp(port: u16, source: RuleSource) -> Self {
        Self {
            source,
            ports: PortRange::single(port),
            protocol: Protocol::Tcp,
        }
    }

    /// Diagnostic ICMP from the given source.
    #[must_use]
    pub fn icmp(source: RuleSource) -> Self {
        Self {
            source,
            ports: PortRange::ALL,
            protocol: Protocol::Icmp,
        }
    }

    /// Every protocol and port from the given source (east-west cluster
    /// traffic).
    #[must_use]
    pub fn all(source: RuleSource) -> Self {
        Self {
            source,
            ports: PortRange::ALL,
            protocol: Protocol::All,
        }
    }
}
