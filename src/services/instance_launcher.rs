use std::fmt;
use std::sync::Arc;

use log::{error, info};
use validator::Validate;

use crate::models::cloud_provider::{LaunchCloudInstance, ProviderError};
use crate::models::instance::{
    describe_validation_errors, InstanceCreateRequest, InstanceInfo, PENDING_IP,
};
use crate::services::cloud_compute::CloudCompute;
use crate::services::network_resolver::NetworkResolver;

#[derive(Debug, PartialEq, Eq)]
pub enum LaunchError {
    Invalid(String),
    NoDefaultNetwork,
    NoSubnet,
    Provider(ProviderError),
    WaitFailed(ProviderError),
}

impl std::error::Error for LaunchError {}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LaunchError::Invalid(detail) => write!(f, "Invalid request: {}", detail),
            LaunchError::NoDefaultNetwork => write!(f, "No default VPC found!"),
            LaunchError::NoSubnet => write!(f, "No subnet found!"),
            LaunchError::Provider(err) | LaunchError::WaitFailed(err) => write!(f, "{}", err),
        }
    }
}

/// Places one instance in the default VPC and waits for it to come up.
///
/// Nothing is rolled back: if the wait or the final describe fails, the
/// instance keeps running at the provider.
pub struct InstanceLauncher {
    compute: Arc<dyn CloudCompute>,
    resolver: NetworkResolver,
}

impl InstanceLauncher {
    pub fn new(compute: Arc<dyn CloudCompute>) -> Self {
        let resolver = NetworkResolver::new(compute.clone());
        Self { compute, resolver }
    }

    pub async fn launch(&self, request: &InstanceCreateRequest) -> Result<InstanceInfo, LaunchError> {
        request
            .validate()
            .map_err(|errors| LaunchError::Invalid(describe_validation_errors(&errors)))?;

        let network_id = self
            .resolver
            .resolve_default_network()
            .await
            .ok_or(LaunchError::NoDefaultNetwork)?;
        let subnet_id = self
            .resolver
            .resolve_subnet(&network_id)
            .await
            .ok_or(LaunchError::NoSubnet)?;

        let launch = LaunchCloudInstance {
            name: request.instance_name.clone(),
            image_id: request.ami_id.clone(),
            instance_type: request.instance_type.clone(),
            key_name: request.key_name.clone(),
            security_group_id: request.security_group_id.clone(),
            subnet_id,
        };

        info!(
            "Launching {} instance {:?} from {} in {}",
            launch.instance_type, launch.name, launch.image_id, launch.subnet_id
        );
        let instance_id = self
            .compute
            .create_instance(&launch)
            .await
            .map_err(LaunchError::Provider)?;

        if let Err(err) = self.compute.wait_until_running(&instance_id).await {
            error!("Instance {} did not reach running: {}", instance_id, err);
            return Err(LaunchError::WaitFailed(err));
        }

        let instance = self
            .compute
            .describe_instance(&instance_id)
            .await
            .map_err(LaunchError::Provider)?;
        info!("Instance {} is {}", instance.id, instance.state);

        Ok(InstanceInfo::new(
            instance_id,
            launch.name,
            instance.state,
            instance.ip_address.unwrap_or_else(|| PENDING_IP.to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cloud_provider::InstanceState;
    use crate::services::cloud_compute::testing::ScriptedCompute;

    fn request() -> InstanceCreateRequest {
        InstanceCreateRequest {
            instance_type: "t2.micro".to_string(),
            ami_id: "ami-123".to_string(),
            key_name: "k1".to_string(),
            security_group_id: "sg-1".to_string(),
            instance_name: "demo".to_string(),
        }
    }

    #[tokio::test]
    async fn test_launch_returns_running_instance() {
        let compute = Arc::new(ScriptedCompute::new());
        let launcher = InstanceLauncher::new(compute.clone());

        let info = launcher.launch(&request()).await.expect("launch");

        assert!(info.id.starts_with("i-"));
        assert_eq!(info.name, "demo");
        assert_eq!(info.state, InstanceState::Running);
        assert_eq!(info.public_ip, "54.12.0.7");
        assert!(info.console_url.ends_with(&info.id));

        let launches = compute.launches();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].subnet_id, "subnet-1");
        assert_eq!(launches[0].security_group_id, "sg-1");
        assert_eq!(launches[0].key_name, "k1");
    }

    #[tokio::test]
    async fn test_launch_reports_provider_state_after_wait() {
        let mut compute = ScriptedCompute::new();
        compute.running_state = InstanceState::Other("rebooting".to_string());
        let launcher = InstanceLauncher::new(Arc::new(compute));

        let info = launcher.launch(&request()).await.expect("launch");
        assert_eq!(info.state.as_str(), "rebooting");
    }

    #[tokio::test]
    async fn test_launch_without_address_reports_pending() {
        let mut compute = ScriptedCompute::new();
        compute.public_ip = None;
        let launcher = InstanceLauncher::new(Arc::new(compute));

        let info = launcher.launch(&request()).await.expect("launch");
        assert_eq!(info.public_ip, "Pending");
    }

    #[tokio::test]
    async fn test_launch_without_default_vpc_creates_nothing() {
        let mut compute = ScriptedCompute::new();
        compute.default_networks = Err(ProviderError::new("AuthFailure"));
        let compute = Arc::new(compute);
        let launcher = InstanceLauncher::new(compute.clone());

        assert_eq!(
            launcher.launch(&request()).await,
            Err(LaunchError::NoDefaultNetwork)
        );
        assert_eq!(compute.calls(), vec!["default_networks"]);
    }

    #[tokio::test]
    async fn test_launch_without_subnet_creates_nothing() {
        let mut compute = ScriptedCompute::new();
        compute.subnets = Ok(vec![]);
        let compute = Arc::new(compute);
        let launcher = InstanceLauncher::new(compute.clone());

        assert_eq!(launcher.launch(&request()).await, Err(LaunchError::NoSubnet));
        assert!(compute.launches().is_empty());
    }

    #[tokio::test]
    async fn test_launch_rejects_empty_fields_before_any_call() {
        let compute = Arc::new(ScriptedCompute::new());
        let launcher = InstanceLauncher::new(compute.clone());
        let mut request = request();
        request.instance_name = String::new();

        assert_eq!(
            launcher.launch(&request).await,
            Err(LaunchError::Invalid(
                "missing value for instance_name".to_string()
            ))
        );
        assert!(compute.calls().is_empty());
    }

    #[tokio::test]
    async fn test_wait_failure_leaves_instance_in_place() {
        let mut compute = ScriptedCompute::new();
        compute.wait_error = Some(ProviderError::new(
            "Waiter InstanceRunning failed: max attempts exceeded",
        ));
        let compute = Arc::new(compute);
        let launcher = InstanceLauncher::new(compute.clone());

        let err = launcher.launch(&request()).await.expect_err("wait fails");
        assert!(matches!(err, LaunchError::WaitFailed(_)));
        assert_eq!(compute.launches().len(), 1);
        assert!(!compute
            .calls()
            .iter()
            .any(|call| call.starts_with("terminate_instance")));
    }
}
