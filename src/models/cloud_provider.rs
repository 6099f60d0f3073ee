use std::error::Error;
use std::fmt::{self, Display, Formatter};

pub type NetworkId = String;
pub type SubnetId = String;

pub const NAME_TAG: &str = "Name";

/// Everything the provider needs to place a single instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCloudInstance {
    pub name: String,
    pub image_id: String,
    pub instance_type: String,
    pub key_name: String,
    pub security_group_id: String,
    pub subnet_id: SubnetId,
}

/// An instance as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudInstance {
    pub id: String,
    pub state: InstanceState,
    pub ip_address: Option<String>,
    pub tags: Vec<(String, String)>,
}

impl CloudInstance {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Other(String),
}

impl InstanceState {
    pub fn as_str(&self) -> &str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for InstanceState {
    fn from(value: &str) -> Self {
        match value {
            "pending" => InstanceState::Pending,
            "running" => InstanceState::Running,
            "shutting-down" => InstanceState::ShuttingDown,
            "terminated" => InstanceState::Terminated,
            "stopping" => InstanceState::Stopping,
            "stopped" => InstanceState::Stopped,
            other => InstanceState::Other(other.to_string()),
        }
    }
}

impl Display for InstanceState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by the provider, carrying its message verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError(String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        ProviderError(message.into())
    }
}

impl Error for ProviderError {}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
