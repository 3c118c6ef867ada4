//! Training task records as reported by the remote training service.
//!
//! The list endpoint returns summaries and the progress endpoint returns
//! full records, both in the same shape. Every field other than `task_id`
//! and `status` may therefore be absent, and unrecognised fields are kept
//! in `extra` so that a merge can carry them forward.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{lenient_timestamp, TaskId, Timestamp};

/// Default page size for the task list endpoint.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle status of a training task.
///
/// The service is expected to move tasks `pending -> running -> completed |
/// failed`, but nothing here enforces that order. Any other value decodes as
/// [`TaskStatus::Unknown`] so one odd record cannot fail a whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Wire representation, as used in the `status` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two training modes offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// Train a model from scratch.
    Full,
    /// Continue training from a previously completed task.
    Incremental,
}

impl TrainingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TrainingMode::Full => "full",
            TrainingMode::Incremental => "incremental",
        }
    }
}

// ---------------------------------------------------------------------------
// Nested records
// ---------------------------------------------------------------------------

/// Parameters a task was submitted with.
///
/// The list endpoint usually omits most of these; a config without
/// `num_classes` is treated as not yet hydrated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_classes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epochs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stage-level completion reported for a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Overall completion percentage (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_progress: Option<f64>,
    /// Name of the stage currently executing, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    /// Per-stage details; shape is owned by the service.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskProgress {
    /// Convenience constructor for a bare overall percentage.
    pub fn overall(percent: f64) -> Self {
        Self {
            overall_progress: Some(percent),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// One training job instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TrainingMode>,
    pub status: TaskStatus,
    #[serde(default, with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TrainingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<TaskProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    /// Fields the service sent that this model does not name.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// A summary-only task with nothing but an id and a status.
    pub fn new(task_id: impl Into<TaskId>, status: TaskStatus) -> Self {
        Self {
            task_id: task_id.into(),
            task_type: None,
            status,
            created_at: None,
            started_at: None,
            completed_at: None,
            config: None,
            progress: None,
            results: None,
            extra: Map::new(),
        }
    }

    /// Whether this task still lacks the detail fields only the progress
    /// endpoint provides.
    ///
    /// Running tasks are never candidates; they are kept fresh by the
    /// progress refresher instead.
    pub fn needs_hydration(&self) -> bool {
        if self.status == TaskStatus::Running {
            return false;
        }
        let has_num_classes = self
            .config
            .as_ref()
            .is_some_and(|c| c.num_classes.is_some());
        !has_num_classes || self.results.is_none()
    }
}

// ---------------------------------------------------------------------------
// List endpoint
// ---------------------------------------------------------------------------

/// Response body of `GET /tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub total: u64,
}

/// Query parameters for `GET /tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<TaskStatus>,
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListQuery {
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}
