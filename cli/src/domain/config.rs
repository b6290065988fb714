//! Deployment configuration.
//!
//! One explicit struct passed by value into services — no process-wide
//! mutable state. Defaults describe the lab environment; the CLI overrides
//! individual fields from flags and environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Tag applied to every instance and trust group this tool creates; cleanup
/// selects resources by this tag.
pub const RESOURCE_TAG: &str = "stratus";

/// Ubuntu 22.04 in us-east-1.
pub const DEFAULT_IMAGE_ID: &str = "ami-053b0d53c279acc90";

#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub resource_tag: String,
    pub image_id: String,
    pub keypair_name: String,
    /// Private key matching `keypair_name`, used for remote shell access.
    pub identity_file: PathBuf,
    pub ssh_username: String,
    pub db_root_password: String,
    /// Delay between readiness polls of a launched node.
    pub poll_interval: Duration,
    /// Delay between remote shell retries (connect and execute layers).
    pub retry_delay: Duration,
    /// `None` retries forever; a provisioning run is expected to eventually
    /// succeed or be aborted by the operator. Tests substitute a bound.
    pub retry_limit: Option<u32>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            resource_tag: RESOURCE_TAG.into(),
            image_id: DEFAULT_IMAGE_ID.into(),
            keypair_name: "stratus-keypair".into(),
            identity_file: PathBuf::from("stratus.pem"),
            ssh_username: "ubuntu".into(),
            db_root_password: String::new(),
            poll_interval: Duration::from_secs(5),
            retry_delay: Duration::from_secs(5),
            retry_limit: None,
        }
    }
}
