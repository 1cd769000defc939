use serde::{Deserialize, Serialize};

use crate::common::errors::Error;

pub mod config;
pub mod datasync;
pub mod errors;
pub mod logging;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod utils;

/// Invocation payload, identical for the initial trigger and every re-invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRequest {
    pub id: String,
    pub region_name: String,
    pub task_execution_arn: String,
}

impl PollRequest {
    pub fn validate(&self) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::InvalidRequest("id is empty"));
        }
        if self.region_name.is_empty() {
            return Err(Error::InvalidRequest("region_name is empty"));
        }
        if self.task_execution_arn.is_empty() {
            return Err(Error::InvalidRequest("task_execution_arn is empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_keeps_wire_field_names() {
        let request: PollRequest = serde_json::from_value(json!({
            "id": "job-1",
            "region_name": "us-east-1",
            "task_execution_arn": "arn:aws:datasync:us-east-1:1:task/t-1/execution/exec-abc",
        }))
        .unwrap();

        assert_eq!(request.id, "job-1");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "id": "job-1",
                "region_name": "us-east-1",
                "task_execution_arn": "arn:aws:datasync:us-east-1:1:task/t-1/execution/exec-abc",
            })
        );
    }

    #[test]
    fn missing_field_fails_deserialization() {
        let result = serde_json::from_value::<PollRequest>(json!({
            "id": "job-1",
            "region_name": "us-east-1",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn empty_fields_are_invalid() {
        let valid = PollRequest {
            id: "job-1".into(),
            region_name: "us-east-1".into(),
            task_execution_arn: "arn:exec".into(),
        };
        assert!(valid.validate().is_ok());

        for request in [
            PollRequest {
                id: String::new(),
                ..valid.clone()
            },
            PollRequest {
                region_name: String::new(),
                ..valid.clone()
            },
            PollRequest {
                task_execution_arn: String::new(),
                ..valid.clone()
            },
        ] {
            assert!(matches!(request.validate(), Err(Error::InvalidRequest(_))));
        }
    }
}
