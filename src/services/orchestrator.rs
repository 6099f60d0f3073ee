use std::sync::Arc;

use log::{error, info, warn};

use crate::models::console_form::ConsoleAction;
use crate::models::instance::{InstanceCreateRequest, InstanceTerminateRequest, OperationResult};
use crate::services::cloud_compute::CloudCompute;
use crate::services::instance_launcher::{InstanceLauncher, LaunchError};
use crate::services::instance_terminator::{InstanceTerminator, TerminateError};

/// Single entry point behind the console form. Every outcome, including
/// provider failures, comes back as an `OperationResult`.
pub struct Orchestrator {
    launcher: InstanceLauncher,
    terminator: InstanceTerminator,
}

impl Orchestrator {
    pub fn new(compute: Arc<dyn CloudCompute>) -> Self {
        Self {
            launcher: InstanceLauncher::new(compute.clone()),
            terminator: InstanceTerminator::new(compute),
        }
    }

    pub async fn handle(&self, action: ConsoleAction) -> OperationResult {
        match action {
            ConsoleAction::Create(request) => self.create(&request).await,
            ConsoleAction::Destroy(request) => self.destroy(&request).await,
            ConsoleAction::Unknown(action) => {
                // Unrecognised actions render the bare form, same as a GET.
                warn!("Ignoring unknown console action {:?}", action);
                OperationResult::default()
            }
        }
    }

    async fn create(&self, request: &InstanceCreateRequest) -> OperationResult {
        match self.launcher.launch(request).await {
            Ok(info) => {
                let message = format!("✅ Instance {} launched successfully!", info.id);
                OperationResult::with_instance(message, info)
            }
            Err(
                err @ (LaunchError::Invalid(_) | LaunchError::NoDefaultNetwork | LaunchError::NoSubnet),
            ) => {
                warn!("Launch of {:?} aborted: {}", request.instance_name, err);
                OperationResult::message(format!("⚠️ {}", err))
            }
            Err(err @ (LaunchError::Provider(_) | LaunchError::WaitFailed(_))) => {
                error!("Launch of {:?} failed: {}", request.instance_name, err);
                OperationResult::message(format!("❌ AWS Error: {}", err))
            }
        }
    }

    async fn destroy(&self, request: &InstanceTerminateRequest) -> OperationResult {
        match self.terminator.terminate(request).await {
            Ok(info) => {
                info!("Reporting termination of {}", info.id);
                let message = format!(
                    "❌ Instance {} ({}) terminated successfully.",
                    info.id, info.name
                );
                OperationResult::with_instance(message, info)
            }
            Err(err @ TerminateError::Invalid(_)) => OperationResult::message(format!("⚠️ {}", err)),
            Err(err @ TerminateError::Provider(_)) => {
                error!("Termination of {} failed: {}", request.instance_id, err);
                OperationResult::message(format!("❌ AWS Error: {}", err))
            }
        }
    }
}
