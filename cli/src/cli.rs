//! CLI argument parsing with clap derive.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::commands;
use crate::domain::DeployConfig;
use crate::domain::config::DEFAULT_IMAGE_ID;

/// Automated MySQL cluster topologies on EC2
#[derive(Parser)]
#[command(
    name = "stratus",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub options: DeployOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct DeployOptions {
    /// EC2 key pair attached to launched nodes
    #[arg(long, global = true, default_value = "stratus-keypair")]
    pub keypair: String,

    /// Private key file for remote shell access
    #[arg(long, global = true, default_value = "stratus.pem")]
    pub identity_file: PathBuf,

    /// Machine image to launch
    #[arg(long, global = true, default_value = DEFAULT_IMAGE_ID)]
    pub image_id: String,

    /// Database root password
    #[arg(long, global = true, env = "STRATUS_ROOT_PASSWORD", default_value = "")]
    pub root_password: String,
}

impl DeployOptions {
    fn into_config(self) -> DeployConfig {
        DeployConfig {
            keypair_name: self.keypair,
            identity_file: self.identity_file,
            image_id: self.image_id,
            db_root_password: self.root_password,
            ..DeployConfig::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy a single database node
    Standalone,

    /// Deploy a four-node replicated cluster
    Cluster,

    /// Deploy the cluster behind a proxy, trusted host, and gatekeeper
    Gatekeeper,

    /// Terminate tagged nodes and delete tagged trust groups
    Cleanup,
}

impl Cli {
    /// # Errors
    ///
    /// Returns the first unrecovered deployment or cleanup error.
    pub async fn run(self) -> Result<()> {
        let cfg = self.options.into_config();
        match self.command {
            Command::Standalone => commands::deploy::standalone(&cfg).await,
            Command::Cluster => commands::deploy::cluster(&cfg).await,
            Command::Gatekeeper => commands::deploy::gatekeeper(&cfg).await,
            Command::Cleanup => commands::cleanup::run(&cfg).await,
        }
    }
}
