use validator::{Validate, ValidationErrors};

use super::cloud_provider::InstanceState;

pub const CONSOLE_URL_PREFIX: &str =
    "https://console.aws.amazon.com/ec2/v2/home#Instances:instanceId=";

/// Shown while a freshly running instance has no public address yet.
pub const PENDING_IP: &str = "Pending";
pub const NOT_AVAILABLE: &str = "N/A";

// -----------------------------------------------------------------------------
// Requests
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct InstanceCreateRequest {
    #[validate(length(min = 1))]
    pub instance_type: String,
    #[validate(length(min = 1))]
    pub ami_id: String,
    #[validate(length(min = 1))]
    pub key_name: String,
    #[validate(length(min = 1))]
    pub security_group_id: String,
    #[validate(length(min = 1))]
    pub instance_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct InstanceTerminateRequest {
    #[validate(length(min = 1))]
    pub instance_id: String,
}

/// Collapses validator output into a single line naming the empty fields.
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| field.to_string())
        .collect();
    fields.sort();

    format!("missing value for {}", fields.join(", "))
}

// -----------------------------------------------------------------------------
// Results
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub id: String,
    pub name: String,
    pub state: InstanceState,
    pub public_ip: String,
    pub console_url: String,
}

impl InstanceInfo {
    pub fn new(id: String, name: String, state: InstanceState, public_ip: String) -> Self {
        let console_url = console_url(&id);
        InstanceInfo {
            id,
            name,
            state,
            public_ip,
            console_url,
        }
    }
}

pub fn console_url(instance_id: &str) -> String {
    format!("{}{}", CONSOLE_URL_PREFIX, instance_id)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResult {
    pub message: Option<String>,
    pub instance_info: Option<InstanceInfo>,
}

impl OperationResult {
    pub fn message(message: impl Into<String>) -> Self {
        OperationResult {
            message: Some(message.into()),
            instance_info: None,
        }
    }

    pub fn with_instance(message: impl Into<String>, instance_info: InstanceInfo) -> Self {
        OperationResult {
            message: Some(message.into()),
            instance_info: Some(instance_info),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> InstanceCreateRequest {
        InstanceCreateRequest {
            instance_type: "t2.micro".to_string(),
            ami_id: "ami-123".to_string(),
            key_name: "k1".to_string(),
            security_group_id: "sg-1".to_string(),
            instance_name: "demo".to_string(),
        }
    }

    #[test]
    fn test_complete_request_is_valid() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn test_empty_fields_are_named() {
        let mut request = create_request();
        request.key_name = String::new();
        request.ami_id = String::new();

        let errors = request.validate().expect_err("empty fields should not validate");
        assert_eq!(
            describe_validation_errors(&errors),
            "missing value for ami_id, key_name"
        );
    }

    #[test]
    fn test_console_url_embeds_instance_id() {
        let info = InstanceInfo::new(
            "i-0abc".to_string(),
            "demo".to_string(),
            InstanceState::Running,
            PENDING_IP.to_string(),
        );

        assert_eq!(
            info.console_url,
            "https://console.aws.amazon.com/ec2/v2/home#Instances:instanceId=i-0abc"
        );
    }
}
