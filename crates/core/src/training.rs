//! Request and response bodies for submitting new training tasks.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::task::{TaskStatus, TrainingConfig, TrainingMode};
use crate::types::TaskId;

/// Body of `POST /train/{mode}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequest {
    /// Dataset location as understood by the training service.
    pub dataset: String,
    #[serde(flatten)]
    pub config: TrainingConfig,
    /// Completed task to continue from; required for incremental training.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_task_id: Option<TaskId>,
}

impl TrainingRequest {
    /// Check the request is coherent for `mode` before it is sent.
    pub fn validate(&self, mode: TrainingMode) -> Result<(), CoreError> {
        if self.dataset.trim().is_empty() {
            return Err(CoreError::Validation("dataset must not be empty".into()));
        }
        if self.config.num_classes == Some(0) {
            return Err(CoreError::Validation("num_classes must be positive".into()));
        }
        match (mode, &self.base_task_id) {
            (TrainingMode::Incremental, None) => Err(CoreError::Validation(
                "incremental training requires base_task_id".into(),
            )),
            (TrainingMode::Full, Some(_)) => Err(CoreError::Validation(
                "full training does not accept base_task_id".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Response of `POST /train/{mode}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartTrainingResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn request() -> TrainingRequest {
        TrainingRequest {
            dataset: "datasets/flowers".into(),
            config: TrainingConfig {
                num_classes: Some(5),
                epochs: Some(10),
                ..Default::default()
            },
            base_task_id: None,
        }
    }

    #[test]
    fn full_request_is_valid() {
        assert!(request().validate(TrainingMode::Full).is_ok());
    }

    #[test]
    fn incremental_requires_base_task() {
        assert_matches!(
            request().validate(TrainingMode::Incremental),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn full_rejects_base_task() {
        let req = TrainingRequest {
            base_task_id: Some("t1".into()),
            ..request()
        };
        assert_matches!(req.validate(TrainingMode::Full), Err(CoreError::Validation(_)));
        assert!(req.validate(TrainingMode::Incremental).is_ok());
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let req = TrainingRequest {
            dataset: "  ".into(),
            ..request()
        };
        assert_matches!(req.validate(TrainingMode::Full), Err(CoreError::Validation(_)));
    }

    #[test]
    fn config_is_flattened_into_body() {
        let body = serde_json::to_value(request()).unwrap();
        assert_eq!(body["num_classes"], 5);
        assert_eq!(body["epochs"], 10);
        assert!(body.get("base_task_id").is_none());
    }
}
