//! Cloud compute adapter routing every platform call through the aws CLI.
//!
//! Generic over `R: CommandRunner` so tests can inject a recording runner
//! instead of spawning real processes. Platform failures are classified by
//! the error code the CLI prints (`An error occurred (Code) when calling
//! ...`) and surfaced as typed [`CloudError`]s.

use std::process::Output;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::application::ports::CloudCompute;
use crate::domain::{
    CloudError, DeployConfig, IngressRule, MachineSize, Network, Node, NodeId, NodeState,
    TrustGroupId, Zone,
};
use crate::infra::command_runner::{CommandRunner, DEFAULT_CMD_TIMEOUT, TokioCommandRunner};

/// Root volume for every launched node.
const VOLUME_GIB: u32 = 15;

pub struct AwsCliCompute<R: CommandRunner> {
    runner: R,
    resource_tag: String,
    image_id: String,
    keypair_name: String,
}

impl<R: CommandRunner> AwsCliCompute<R> {
    pub fn new(runner: R, cfg: &DeployConfig) -> Self {
        Self {
            runner,
            resource_tag: cfg.resource_tag.clone(),
            image_id: cfg.image_id.clone(),
            keypair_name: cfg.keypair_name.clone(),
        }
    }

    async fn aws(&self, args: &[&str]) -> Result<Value> {
        let mut full_args = vec!["ec2"];
        full_args.extend_from_slice(args);
        full_args.extend_from_slice(&["--output", "json"]);
        let output = self
            .runner
            .run("aws", &full_args)
            .await
            .with_context(|| format!("failed to run aws ec2 {}", args[0]))?;
        if !output.status.success() {
            return Err(classify(&output).into());
        }
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&output.stdout)
            .with_context(|| format!("invalid JSON from aws ec2 {}", args[0]))
    }

    fn tag_spec(&self, resource_type: &str) -> String {
        format!(
            "ResourceType={resource_type},Tags=[{{Key=Name,Value={}}}]",
            self.resource_tag
        )
    }
}

impl AwsCliCompute<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(cfg: &DeployConfig) -> Self {
        Self::new(TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT), cfg)
    }
}

impl<R: CommandRunner> CloudCompute for AwsCliCompute<R> {
    async fn default_network(&self) -> Result<Network> {
        let value = self
            .aws(&[
                "describe-vpcs",
                "--filters",
                "Name=is-default,Values=true",
            ])
            .await?;
        let vpc = value
            .get("Vpcs")
            .and_then(|v| v.as_array())
            .and_then(|v| v.first())
            .context("no default VPC found")?;
        Ok(Network {
            id: string_field(vpc, "VpcId")?,
            cidr: string_field(vpc, "CidrBlock")?,
        })
    }

    async fn available_zones(&self) -> Result<Vec<Zone>> {
        let value = self.aws(&["describe-availability-zones"]).await?;
        let zones = value
            .get("AvailabilityZones")
            .and_then(|v| v.as_array())
            .context("no AvailabilityZones in response")?;
        Ok(zones
            .iter()
            .filter_map(|z| z.get("ZoneName").and_then(Value::as_str))
            .map(|name| Zone(name.to_owned()))
            .collect())
    }

    async fn create_security_group(&self, network: &Network) -> Result<TrustGroupId> {
        let group_name = format!("{}-{}", self.resource_tag, unique_suffix());
        let tag_spec = self.tag_spec("security-group");
        let value = self
            .aws(&[
                "create-security-group",
                "--group-name",
                &group_name,
                "--description",
                &self.resource_tag,
                "--vpc-id",
                &network.id,
                "--tag-specifications",
                &tag_spec,
            ])
            .await?;
        Ok(TrustGroupId(string_field(&value, "GroupId")?))
    }

    async fn authorize_ingress(&self, group: &TrustGroupId, rules: &[IngressRule]) -> Result<()> {
        let permissions: Vec<Value> = rules
            .iter()
            .map(|rule| {
                json!({
                    "IpProtocol": rule.protocol.wire_name(),
                    "FromPort": rule.ports.from,
                    "ToPort": rule.ports.to,
                    "IpRanges": [{"CidrIp": rule.source.cidr()}],
                })
            })
            .collect();
        let permissions = serde_json::to_string(&permissions)?;
        self.aws(&[
            "authorize-security-group-ingress",
            "--group-id",
            &group.0,
            "--ip-permissions",
            &permissions,
        ])
        .await?;
        Ok(())
    }

    async fn launch_node(
        &self,
        groups: &[TrustGroupId],
        size: MachineSize,
        zone: &Zone,
    ) -> Result<Node> {
        let group_ids: Vec<&str> = groups.iter().map(|g| g.0.as_str()).collect();
        let placement = format!("AvailabilityZone={}", zone.0);
        let block_devices = json!([{
            "DeviceName": "/dev/sda1",
            "Ebs": {"DeleteOnTermination": true, "VolumeSize": VOLUME_GIB, "VolumeType": "gp2"},
        }])
        .to_string();
        let tag_spec = self.tag_spec("instance");

        let mut args = vec![
            "run-instances",
            "--image-id",
            &self.image_id,
            "--instance-type",
            size.instance_type(),
            "--key-name",
            &self.keypair_name,
            "--placement",
            &placement,
            "--block-device-mappings",
            &block_devices,
            "--tag-specifications",
            &tag_spec,
            "--count",
            "1",
            "--security-group-ids",
        ];
        args.extend_from_slice(&group_ids);

        let value = self.aws(&args).await?;
        let instance = value
            .get("Instances")
            .and_then(|v| v.as_array())
            .and_then(|v| v.first())
            .context("no Instances in run-instances response")?;
        node_from_json(instance)
    }

    async fn describe_node(&self, id: &NodeId) -> Result<Node> {
        let value = self
            .aws(&["describe-instances", "--instance-ids", &id.0])
            .await?;
        let instance = value
            .get("Reservations")
            .and_then(|v| v.as_array())
            .and_then(|v| v.first())
            .and_then(|r| r.get("Instances"))
            .and_then(|v| v.as_array())
            .and_then(|v| v.first())
            .with_context(|| format!("instance {id} not found"))?;
        node_from_json(instance)
    }

    async fn list_deployed_nodes(&self) -> Result<Vec<Node>> {
        let name_filter = format!("Name=tag:Name,Values={}", self.resource_tag);
        let value = self
            .aws(&[
                "describe-instances",
                "--filters",
                &name_filter,
                "Name=instance-state-name,Values=pending,running,stopped",
            ])
            .await?;
        let mut nodes = Vec::new();
        for reservation in value
            .get("Reservations")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default()
        {
            for instance in reservation
                .get("Instances")
                .and_then(|v| v.as_array())
                .map(Vec::as_slice)
                .unwrap_or_default()
            {
                nodes.push(node_from_json(instance)?);
            }
        }
        Ok(nodes)
    }

    async fn terminate_node(&self, id: &NodeId) -> Result<()> {
        self.aws(&["terminate-instances", "--instance-ids", &id.0])
            .await?;
        Ok(())
    }

    async fn list_deployed_groups(&self) -> Result<Vec<TrustGroupId>> {
        let name_filter = format!("Name=tag:Name,Values={}", self.resource_tag);
        let value = self
            .aws(&["describe-security-groups", "--filters", &name_filter])
            .await?;
        Ok(value
            .get("SecurityGroups")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|g| g.get("GroupId").and_then(Value::as_str))
            .map(|id| TrustGroupId(id.to_owned()))
            .collect())
    }

    async fn delete_security_group(&self, id: &TrustGroupId) -> Result<()> {
        self.aws(&["delete-security-group", "--group-id", &id.0])
            .await?;
        Ok(())
    }
}

fn node_from_json(instance: &Value) -> Result<Node> {
    let state_name = instance
        .get("State")
        .and_then(|s| s.get("Name"))
        .and_then(Value::as_str)
        .context("instance has no State.Name")?;
    let state = NodeState::from_platform(state_name)
        .with_context(|| format!("unknown instance state {state_name:?}"))?;
    Ok(Node {
        id: NodeId(string_field(instance, "InstanceId")?),
        public_address: instance
            .get("PublicIpAddress")
            .and_then(Value::as_str)
            .map(String::from),
        private_address: instance
            .get("PrivateIpAddress")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        zone: Zone(
            instance
                .get("Placement")
                .and_then(|p| p.get("AvailabilityZone"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        ),
        state,
    })
}

fn string_field(value: &Value, field: &str) -> Result<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(String::from)
        .with_context(|| format!("missing {field} in aws response"))
}

/// Extract the parenthesized error code from aws CLI stderr, e.g.
/// `An error occurred (DependencyViolation) when calling ...`.
fn classify(output: &Output) -> CloudError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let code = stderr
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map_or("Unknown", |(code, _)| code.trim());
    CloudError::from_code(code, stderr.trim())
}

/// Short per-process-unique suffix for generated group names.
fn unique_suffix() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
    );
    format!("{:012x}", hasher.finish() & 0xffff_ffff_ffff)
}
