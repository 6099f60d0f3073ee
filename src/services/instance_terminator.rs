use std::fmt;
use std::sync::Arc;

use log::info;
use validator::Validate;

use crate::models::cloud_provider::{InstanceState, ProviderError, NAME_TAG};
use crate::models::instance::{
    describe_validation_errors, InstanceInfo, InstanceTerminateRequest, NOT_AVAILABLE,
};
use crate::services::cloud_compute::CloudCompute;

#[derive(Debug, PartialEq, Eq)]
pub enum TerminateError {
    Invalid(String),
    Provider(ProviderError),
}

impl std::error::Error for TerminateError {}

impl fmt::Display for TerminateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TerminateError::Invalid(detail) => write!(f, "Invalid request: {}", detail),
            TerminateError::Provider(err) => write!(f, "{}", err),
        }
    }
}

impl From<ProviderError> for TerminateError {
    fn from(err: ProviderError) -> Self {
        TerminateError::Provider(err)
    }
}

pub struct InstanceTerminator {
    compute: Arc<dyn CloudCompute>,
}

impl InstanceTerminator {
    pub fn new(compute: Arc<dyn CloudCompute>) -> Self {
        Self { compute }
    }

    /// Terminates the instance and waits for it to be gone. The describe
    /// afterwards is only there to recover the `Name` tag.
    pub async fn terminate(
        &self,
        request: &InstanceTerminateRequest,
    ) -> Result<InstanceInfo, TerminateError> {
        request
            .validate()
            .map_err(|errors| TerminateError::Invalid(describe_validation_errors(&errors)))?;
        let instance_id = request.instance_id.as_str();

        info!("Terminating instance {}", instance_id);
        self.compute.terminate_instance(instance_id).await?;
        self.compute.wait_until_terminated(instance_id).await?;

        let instance = self.compute.describe_instance(instance_id).await?;
        let name = instance.tag(NAME_TAG).unwrap_or(NOT_AVAILABLE).to_string();
        info!("Instance {} ({}) terminated", instance_id, name);

        Ok(InstanceInfo::new(
            instance_id.to_string(),
            name,
            InstanceState::Terminated,
            NOT_AVAILABLE.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cloud_provider::CloudInstance;
    use crate::services::cloud_compute::testing::ScriptedCompute;

    fn running_instance(id: &str, tags: Vec<(&str, &str)>) -> CloudInstance {
        CloudInstance {
            id: id.to_string(),
            state: InstanceState::Running,
            ip_address: Some("18.0.0.1".to_string()),
            tags: tags
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn request(id: &str) -> InstanceTerminateRequest {
        InstanceTerminateRequest {
            instance_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_terminate_recovers_name_tag() {
        let compute = Arc::new(ScriptedCompute::new());
        compute.insert_instance(running_instance("i-web1", vec![("Name", "web1")]));
        let terminator = InstanceTerminator::new(compute.clone());

        let info = terminator.terminate(&request("i-web1")).await.expect("terminate");

        assert_eq!(info.id, "i-web1");
        assert_eq!(info.name, "web1");
        assert_eq!(info.state, InstanceState::Terminated);
        assert_eq!(info.public_ip, "N/A");
        assert_eq!(
            compute.calls(),
            vec![
                "terminate_instance:i-web1",
                "wait_until_terminated:i-web1",
                "describe_instance:i-web1",
            ]
        );
    }

    #[tokio::test]
    async fn test_terminate_without_name_tag_reports_na() {
        let compute = Arc::new(ScriptedCompute::new());
        compute.insert_instance(running_instance("i-anon", vec![("team", "infra")]));
        let terminator = InstanceTerminator::new(compute.clone());

        let info = terminator.terminate(&request("i-anon")).await.expect("terminate");

        assert_eq!(info.name, "N/A");
        assert_eq!(info.public_ip, "N/A");
    }

    #[tokio::test]
    async fn test_terminate_surfaces_provider_error_verbatim() {
        let mut compute = ScriptedCompute::new();
        compute.terminate_error = Some(ProviderError::new(
            "UnauthorizedOperation: You are not authorized to perform this operation.",
        ));
        let terminator = InstanceTerminator::new(Arc::new(compute));

        let err = terminator
            .terminate(&request("i-web1"))
            .await
            .expect_err("terminate fails");

        assert_eq!(
            err.to_string(),
            "UnauthorizedOperation: You are not authorized to perform this operation."
        );
    }

    #[tokio::test]
    async fn test_terminate_unknown_instance_fails() {
        let compute = Arc::new(ScriptedCompute::new());
        let terminator = InstanceTerminator::new(compute.clone());

        let err = terminator
            .terminate(&request("i-missing"))
            .await
            .expect_err("unknown instance");

        assert!(err.to_string().contains("InvalidInstanceID.NotFound"));
        assert_eq!(compute.calls(), vec!["terminate_instance:i-missing"]);
    }
}
