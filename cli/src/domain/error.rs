//! Typed deployment error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator. Retry predicates classify errors by
//! downcasting to these types; everything that is not classified transient
//! propagates up and aborts the run.

use thiserror::Error;

// ── Cloud platform errors ─────────────────────────────────────────────────────

/// Errors surfaced by the compute capability.
///
/// Allocation failures (capacity, quota, validation) are fatal by design:
/// retrying an allocation is an orchestration policy decision, and this
/// system's policy is to abort and let the operator run cleanup.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("compute capacity exhausted: {0}")]
    Capacity(String),

    #[error("account quota exceeded: {0}")]
    Quota(String),

    #[error("resource has dependent resources: {0}")]
    DependencyViolation(String),

    #[error("resource is still in use: {0}")]
    ResourceInUse(String),

    #[error("resource no longer exists: {0}")]
    NotFound(String),

    #[error("{code}: {message}")]
    Api { code: String, message: String },
}

impl CloudError {
    /// Build from a platform error code plus its message text.
    #[must_use]
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "InsufficientInstanceCapacity" => Self::Capacity(message),
            "DependencyViolation" => Self::DependencyViolation(message),
            "ResourceInUse" => Self::ResourceInUse(message),
            code if code.ends_with(".NotFound") => Self::NotFound(message),
            code if code.contains("LimitExceeded") => Self::Quota(message),
            code => Self::Api {
                code: code.to_owned(),
                message,
            },
        }
    }

    /// Contention during teardown: something still references the resource.
    /// Cleanup retries these with a fixed delay.
    #[must_use]
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::DependencyViolation(_) | Self::ResourceInUse(_))
    }

    /// The resource is already gone; cleanup treats this as success.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ── Remote shell errors ───────────────────────────────────────────────────────

/// Errors surfaced by the remote shell capability.
#[derive(Debug, Error)]
pub enum ShellError {
    /// No session could be established (sshd not up yet, transient network
    /// timeout). Absorbs the race between "node reports running" and the
    /// shell daemon actually accepting connections.
    #[error("connection to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    #[error("transfer to {remote_path} failed: {reason}")]
    Transfer { remote_path: String, reason: String },

    #[error("remote command exited with status {status}")]
    Exec { status: i32 },
}

impl ShellError {
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    /// Upload or remote-command failure; the whole upload-and-execute
    /// sequence is re-run for these.
    #[must_use]
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Transfer { .. } | Self::Exec { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_variants() {
        assert!(matches!(
            CloudError::from_code("InsufficientInstanceCapacity", "no t2.micro"),
            CloudError::Capacity(_)
        ));
        assert!(matches!(
            CloudError::from_code("InvalidGroup.NotFound", "gone"),
            CloudError::NotFound(_)
        ));
        assert!(matches!(
            CloudError::from_code("InstanceLimitExceeded", "quota"),
            CloudError::Quota(_)
        ));
        assert!(matches!(
            CloudError::from_code("UnauthorizedOperation", "denied"),
            CloudError::Api { .. }
        ));
    }

    #[test]
    fn contention_covers_teardown_races_only() {
        assert!(CloudError::from_code("DependencyViolation", "").is_contention());
        assert!(CloudError::from_code("ResourceInUse", "").is_contention());
        assert!(!CloudError::from_code("UnauthorizedOperation", "").is_contention());
        assert!(CloudError::from_code("InvalidGroup.NotFound", "").is_gone());
    }

    #[test]
    fn shell_errors_classify_by_retry_layer() {
        let connect = ShellError::Connect {
            address: "52.1.2.3".into(),
            reason: "timed out".into(),
        };
        assert!(connect.is_connect());
        assert!(!connect.is_execution());
        assert!(ShellError::Exec { status: 1 }.is_execution());
        assert!(
            ShellError::Transfer {
                remote_path: "x.sh".into(),
                reason: "closed".into()
            }
            .is_execution()
        );
    }
}
