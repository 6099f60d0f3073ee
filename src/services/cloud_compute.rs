use async_trait::async_trait;

use crate::models::cloud_provider::{
    CloudInstance, LaunchCloudInstance, NetworkId, ProviderError, SubnetId,
};

/// The slice of a compute provider the console relies on.
///
/// Both waits block until the provider reports the target state or its own
/// poll budget runs out. Callers get no way to cancel them.
#[async_trait]
pub trait CloudCompute: Send + Sync {
    /// Identifiers of the networks the provider flags as default.
    async fn default_networks(&self) -> Result<Vec<NetworkId>, ProviderError>;

    async fn subnets(&self, network_id: &str) -> Result<Vec<SubnetId>, ProviderError>;

    /// Requests exactly one instance and returns its identifier.
    async fn create_instance(&self, launch: &LaunchCloudInstance) -> Result<String, ProviderError>;

    async fn describe_instance(&self, instance_id: &str) -> Result<CloudInstance, ProviderError>;

    async fn terminate_instance(&self, instance_id: &str) -> Result<(), ProviderError>;

    async fn wait_until_running(&self, instance_id: &str) -> Result<(), ProviderError>;

    async fn wait_until_terminated(&self, instance_id: &str) -> Result<(), ProviderError>;
}
