use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use rusoto_core::{HttpClient, RusotoError};
use rusoto_credential::DefaultCredentialsProvider;
use rusoto_ec2::{
    DescribeInstancesRequest, DescribeSubnetsRequest, DescribeVpcsRequest, Ec2, Ec2Client, Filter,
    RunInstancesRequest, Tag, TagSpecification, TerminateInstancesRequest,
};
use rusoto_signature::Region;
use tokio::time::sleep;

use crate::models::cloud_provider::{
    CloudInstance, InstanceState, LaunchCloudInstance, NetworkId, ProviderError, SubnetId,
    NAME_TAG,
};
use crate::services::cloud_compute::CloudCompute;

// -----------------------------------------------------------------------------
// Waiters
// -----------------------------------------------------------------------------

pub const DEFAULT_WAITER_DELAY: Duration = Duration::from_secs(15);
pub const DEFAULT_WAITER_MAX_ATTEMPTS: u32 = 40;

/// Poll budget shared by both instance waiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterConfig {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        WaiterConfig {
            delay: DEFAULT_WAITER_DELAY,
            max_attempts: DEFAULT_WAITER_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitTarget {
    Running,
    Terminated,
}

impl fmt::Display for WaitTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WaitTarget::Running => f.write_str("InstanceRunning"),
            WaitTarget::Terminated => f.write_str("InstanceTerminated"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Acceptor {
    Done,
    Retry,
    Failed,
}

/// Mirrors the acceptors of the EC2 `instance_running` and `instance_terminated` waiters.
fn acceptor(target: WaitTarget, state: &InstanceState) -> Acceptor {
    match (target, state) {
        (WaitTarget::Running, InstanceState::Running) => Acceptor::Done,
        (
            WaitTarget::Running,
            InstanceState::ShuttingDown | InstanceState::Terminated | InstanceState::Stopping,
        ) => Acceptor::Failed,
        (WaitTarget::Terminated, InstanceState::Terminated) => Acceptor::Done,
        (WaitTarget::Terminated, InstanceState::Pending | InstanceState::Stopping) => {
            Acceptor::Failed
        }
        _ => Acceptor::Retry,
    }
}

fn is_not_found(err: &ProviderError) -> bool {
    err.to_string().contains("InvalidInstanceID.NotFound")
}

/// Polls `describe_instance` until the instance reaches `target`, following the
/// EC2 waiter acceptors. No sleep follows the final attempt.
async fn wait_for(
    compute: &dyn CloudCompute,
    instance_id: &str,
    target: WaitTarget,
    waiter: WaiterConfig,
) -> Result<(), ProviderError> {
    for attempt in 1..=waiter.max_attempts {
        match compute.describe_instance(instance_id).await {
            Ok(instance) => match acceptor(target, &instance.state) {
                Acceptor::Done => return Ok(()),
                Acceptor::Failed => {
                    return Err(ProviderError::new(format!(
                        "Waiter {} failed: instance {} entered state {}",
                        target, instance_id, instance.state
                    )))
                }
                Acceptor::Retry => debug!(
                    "{}: instance {} is {} (attempt {}/{})",
                    target, instance_id, instance.state, attempt, waiter.max_attempts
                ),
            },
            Err(err) if target == WaitTarget::Running && is_not_found(&err) => debug!(
                "{}: instance {} not visible yet (attempt {}/{})",
                target, instance_id, attempt, waiter.max_attempts
            ),
            Err(err) => return Err(err),
        }

        if attempt < waiter.max_attempts {
            sleep(waiter.delay).await;
        }
    }

    Err(ProviderError::new(format!(
        "Waiter {} failed: max attempts exceeded for instance {}",
        target, instance_id
    )))
}

// -----------------------------------------------------------------------------
// Errors
// -----------------------------------------------------------------------------

/// EC2 failures reach rusoto as `Unknown` with the XML error document as body;
/// reduce that to `Code: Message`.
fn provider_error<E: std::error::Error + 'static>(err: RusotoError<E>) -> ProviderError {
    if let RusotoError::Unknown(response) = &err {
        let body = response.body_as_str();
        if let (Some(code), Some(message)) =
            (xml_element(body, "Code"), xml_element(body, "Message"))
        {
            return ProviderError::new(format!("{}: {}", code, message));
        }
    }

    ProviderError::new(err.to_string())
}

fn xml_element<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = body.find(&open)? + open.len();
    let end = start + body[start..].find(&close)?;
    Some(body[start..end].trim())
}

// -----------------------------------------------------------------------------
// Requests
// -----------------------------------------------------------------------------

fn filter(name: &str, value: &str) -> Filter {
    Filter {
        name: Some(name.to_string()),
        values: Some(vec![value.to_string()]),
    }
}

fn create_instance_request(launch: &LaunchCloudInstance) -> RunInstancesRequest {
    RunInstancesRequest {
        image_id: Some(launch.image_id.clone()),
        instance_type: Some(launch.instance_type.clone()),
        key_name: Some(launch.key_name.clone()),
        security_group_ids: Some(vec![launch.security_group_id.clone()]),
        subnet_id: Some(launch.subnet_id.clone()),
        min_count: 1,
        max_count: 1,
        tag_specifications: Some(vec![TagSpecification {
            resource_type: Some("instance".to_string()),
            tags: Some(vec![Tag {
                key: Some(NAME_TAG.to_string()),
                value: Some(launch.name.clone()),
            }]),
        }]),
        ..Default::default()
    }
}

fn to_cloud_instance(instance: rusoto_ec2::Instance) -> CloudInstance {
    let state = instance
        .state
        .and_then(|state| state.name)
        .map(|name| InstanceState::from(name.as_str()))
        .unwrap_or_else(|| InstanceState::Other("unknown".to_string()));

    let tags = instance
        .tags
        .unwrap_or_default()
        .into_iter()
        .filter_map(|tag| Some((tag.key?, tag.value.unwrap_or_default())))
        .collect();

    CloudInstance {
        id: instance.instance_id.unwrap_or_default(),
        state,
        ip_address: instance.public_ip_address.filter(|ip| !ip.is_empty()),
        tags,
    }
}

// -----------------------------------------------------------------------------
// Client
// -----------------------------------------------------------------------------

/// EC2-backed compute provider.
pub struct AwsCompute {
    client: Ec2Client,
    waiter: WaiterConfig,
}

impl AwsCompute {
    /// Builds a client from the standard credential chain. Without an explicit
    /// region, rusoto falls back to `AWS_DEFAULT_REGION` / `AWS_REGION` / profile.
    pub fn new(region: Option<Region>, waiter: WaiterConfig) -> anyhow::Result<Self> {
        let region = region.unwrap_or_default();
        info!("Using EC2 region {}", region.name());

        let credentials = DefaultCredentialsProvider::new()?;
        let client = Ec2Client::new_with(HttpClient::new()?, credentials, region);

        Ok(AwsCompute { client, waiter })
    }
}

#[async_trait]
impl CloudCompute for AwsCompute {
    async fn default_networks(&self) -> Result<Vec<NetworkId>, ProviderError> {
        let request = DescribeVpcsRequest {
            filters: Some(vec![filter("isDefault", "true")]),
            ..Default::default()
        };

        let result = self
            .client
            .describe_vpcs(request)
            .await
            .map_err(provider_error)?;

        Ok(result
            .vpcs
            .unwrap_or_default()
            .into_iter()
            .filter_map(|vpc| vpc.vpc_id)
            .collect())
    }

    async fn subnets(&self, network_id: &str) -> Result<Vec<SubnetId>, ProviderError> {
        let request = DescribeSubnetsRequest {
            filters: Some(vec![filter("vpc-id", network_id)]),
            ..Default::default()
        };

        let result = self
            .client
            .describe_subnets(request)
            .await
            .map_err(provider_error)?;

        Ok(result
            .subnets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|subnet| subnet.subnet_id)
            .collect())
    }

    async fn create_instance(&self, launch: &LaunchCloudInstance) -> Result<String, ProviderError> {
        let reservation = self
            .client
            .run_instances(create_instance_request(launch))
            .await
            .map_err(provider_error)?;

        reservation
            .instances
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|instance| instance.instance_id)
            .ok_or_else(|| ProviderError::new("Instance ID not found"))
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<CloudInstance, ProviderError> {
        let request = DescribeInstancesRequest {
            instance_ids: Some(vec![instance_id.to_string()]),
            ..Default::default()
        };

        let result = self
            .client
            .describe_instances(request)
            .await
            .map_err(provider_error)?;

        result
            .reservations
            .unwrap_or_default()
            .into_iter()
            .flat_map(|reservation| reservation.instances.unwrap_or_default())
            .find(|instance| instance.instance_id.as_deref() == Some(instance_id))
            .map(to_cloud_instance)
            .ok_or_else(|| ProviderError::new(format!("Instance {} not found", instance_id)))
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        let request = TerminateInstancesRequest {
            instance_ids: vec![instance_id.to_string()],
            ..Default::default()
        };

        self.client
            .terminate_instances(request)
            .await
            .map_err(provider_error)?;

        Ok(())
    }

    async fn wait_until_running(&self, instance_id: &str) -> Result<(), ProviderError> {
        wait_for(self, instance_id, WaitTarget::Running, self.waiter).await
    }

    async fn wait_until_terminated(&self, instance_id: &str) -> Result<(), ProviderError> {
        wait_for(self, instance_id, WaitTarget::Terminated, self.waiter).await
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
