use std::fmt;

use serde::Deserialize;

use super::instance::{InstanceCreateRequest, InstanceTerminateRequest};

/// Raw fields posted by the console page. Which ones are required depends on `action`.
#[derive(Debug, Default, Deserialize)]
pub struct ConsoleForm {
    pub action: Option<String>,
    pub instance_type: Option<String>,
    pub ami_id: Option<String>,
    pub key_name: Option<String>,
    pub security_group: Option<String>,
    pub instance_name: Option<String>,
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    Create(InstanceCreateRequest),
    Destroy(InstanceTerminateRequest),
    Unknown(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

impl std::error::Error for MissingField {}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Missing required field: {}", self.0)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, MissingField> {
    value.ok_or(MissingField(field))
}

impl TryFrom<ConsoleForm> for ConsoleAction {
    type Error = MissingField;

    fn try_from(form: ConsoleForm) -> Result<Self, Self::Error> {
        let action = required(form.action, "action")?;

        match action.as_str() {
            "create" => Ok(ConsoleAction::Create(InstanceCreateRequest {
                instance_type: required(form.instance_type, "instance_type")?,
                ami_id: required(form.ami_id, "ami_id")?,
                key_name: required(form.key_name, "key_name")?,
                security_group_id: required(form.security_group, "security_group")?,
                instance_name: required(form.instance_name, "instance_name")?,
            })),
            "destroy" => Ok(ConsoleAction::Destroy(InstanceTerminateRequest {
                instance_id: required(form.instance_id, "instance_id")?,
            })),
            _ => Ok(ConsoleAction::Unknown(action)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_form_maps_security_group() {
        let form = ConsoleForm {
            action: Some("create".to_string()),
            instance_type: Some("t2.micro".to_string()),
            ami_id: Some("ami-123".to_string()),
            key_name: Some("k1".to_string()),
            security_group: Some("sg-1".to_string()),
            instance_name: Some("demo".to_string()),
            instance_id: None,
        };

        match ConsoleAction::try_from(form) {
            Ok(ConsoleAction::Create(request)) => {
                assert_eq!(request.security_group_id, "sg-1");
                assert_eq!(request.instance_name, "demo");
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_destroy_form_requires_instance_id() {
        let form = ConsoleForm {
            action: Some("destroy".to_string()),
            ..Default::default()
        };

        let err = ConsoleAction::try_from(form).expect_err("instance_id is required");
        assert_eq!(err, MissingField("instance_id"));
        assert_eq!(err.to_string(), "Missing required field: instance_id");
    }

    #[test]
    fn test_missing_action_is_rejected() {
        let err = ConsoleAction::try_from(ConsoleForm::default()).expect_err("action is required");
        assert_eq!(err, MissingField("action"));
    }

    #[test]
    fn test_unrecognised_action_is_kept() {
        let form = ConsoleForm {
            action: Some("reboot".to_string()),
            ..Default::default()
        };

        assert_eq!(
            ConsoleAction::try_from(form),
            Ok(ConsoleAction::Unknown("reboot".to_string()))
        );
    }
}
