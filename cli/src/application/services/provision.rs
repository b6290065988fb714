//! Provisioning tasks — one idempotent remote script execution per node.

use anyhow::{Context, Result};

use crate::application::ports::{RemoteShell, ShellSession};
use crate::application::services::retry::{RetryPolicies, transient_connect, transient_execution};
use crate::domain::Node;

/// A rendered script plus a per-invocation unique name, used as the remote
/// filename so concurrent tasks on the same node never collide. Stateless
/// and disposable: build one per invocation, never reuse it.
pub struct ProvisioningTask {
    name: String,
    script: String,
}

impl ProvisioningTask {
    #[must_use]
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            name: unique_task_name(),
            script: script.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upload this task's script to `node` and execute it with elevated
    /// privilege.
    ///
    /// Two retry layers apply, both fixed-delay:
    /// - `retry.connect` re-establishes the session while the node is not
    ///   yet accepting connections;
    /// - `retry.execute` re-runs the whole upload-and-execute sequence when
    ///   the transfer or the remote command fails. Scripts must therefore be
    ///   idempotent.
    ///
    /// # Errors
    ///
    /// Fails if the node has no public address, or on any non-transient
    /// error from the shell capability.
    pub async fn apply<S: RemoteShell>(
        &self,
        shell: &S,
        node: &Node,
        retry: &RetryPolicies,
    ) -> Result<()> {
        let address = node
            .public_address
            .as_deref()
            .with_context(|| format!("node {} has no public address", node.id))?;
        tracing::info!(node = %node.id, address, task = %self.name, "provisioning node");

        let remote_path = format!("{}.sh", self.name);
        retry
            .connect
            .run(transient_connect, || async {
                let session = shell.connect(address).await?;
                retry
                    .execute
                    .run(transient_execution, || async {
                        session.upload(self.script.as_bytes(), &remote_path).await?;
                        session
                            .exec(&format!("chmod +x {remote_path} && sudo ./{remote_path}"))
                            .await
                    })
                    .await
            })
            .await
    }
}

/// Generate a unique task name.
///
/// Format: `stratus-` + 4 hex digits of a process-wide sequence number +
/// 16 hex digits of entropy. The sequence number alone guarantees
/// uniqueness within a run; the entropy avoids clashing with files left by
/// an earlier run on the same node.
fn unique_task_name() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    use std::sync::atomic::{AtomicU64, Ordering};

    static TASK_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = TASK_SEQ.fetch_add(1, Ordering::Relaxed);

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
    );
    hasher.write_u64(RandomState::new().build_hasher().finish());
    format!("stratus-{seq:04x}-{:016x}", hasher.finish())
}
