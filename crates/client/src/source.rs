//! Read-only view of the training service used by the sync layer.

use async_trait::async_trait;
use trainsync_core::health::ServerHealth;
use trainsync_core::task::{ListQuery, Task, TaskList};

use crate::api::{ApiError, TrainingApi};

/// The three reads the polling streams perform.
///
/// Implemented by [`TrainingApi`]; tests substitute an in-memory fake.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn health(&self) -> Result<ServerHealth, ApiError>;

    async fn list_tasks(&self, query: &ListQuery) -> Result<TaskList, ApiError>;

    async fn task_detail(&self, task_id: &str) -> Result<Task, ApiError>;
}

#[async_trait]
impl TaskSource for TrainingApi {
    async fn health(&self) -> Result<ServerHealth, ApiError> {
        TrainingApi::health(self).await
    }

    async fn list_tasks(&self, query: &ListQuery) -> Result<TaskList, ApiError> {
        TrainingApi::list_tasks(self, query).await
    }

    async fn task_detail(&self, task_id: &str) -> Result<Task, ApiError> {
        self.task_progress(task_id).await
    }
}
