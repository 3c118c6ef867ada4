#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use trainsync_client::{ApiError, TaskSource};
use trainsync_core::health::{HealthStatus, ServerHealth};
use trainsync_core::task::{ListQuery, Task, TaskList, TaskProgress, TaskStatus, TrainingConfig};
use trainsync_sync::{StoreWriter, TaskStore};

/// In-memory stand-in for the training service.
///
/// Responses are configured per endpoint; detail requests for ids without a
/// configured detail fail with a 404. Call counters and the peak number of
/// concurrently outstanding detail requests are recorded.
pub struct FakeSource {
    health: Mutex<Result<ServerHealth, String>>,
    list: Mutex<Result<Vec<Task>, String>>,
    details: Mutex<HashMap<String, Task>>,
    detail_delay: Duration,
    pub health_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    detail_log: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(10))
    }

    pub fn with_delay(detail_delay: Duration) -> Self {
        Self {
            health: Mutex::new(Ok(healthy())),
            list: Mutex::new(Ok(Vec::new())),
            details: Mutex::new(HashMap::new()),
            detail_delay,
            health_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            detail_log: Mutex::new(Vec::new()),
        }
    }

    pub fn set_health(&self, result: Result<ServerHealth, &str>) {
        *self.health.lock().unwrap() = result.map_err(str::to_string);
    }

    pub fn set_list(&self, result: Result<Vec<Task>, &str>) {
        *self.list.lock().unwrap() = result.map_err(str::to_string);
    }

    pub fn set_detail(&self, task: Task) {
        self.details
            .lock()
            .unwrap()
            .insert(task.task_id.clone(), task);
    }

    pub fn health_count(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_count(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Ids passed to `task_detail`, in call order.
    pub fn detail_requests(&self) -> Vec<String> {
        self.detail_log.lock().unwrap().clone()
    }
}

fn api_error(message: &str) -> ApiError {
    ApiError::Api {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl TaskSource for FakeSource {
    async fn health(&self) -> Result<ServerHealth, ApiError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.health.lock().unwrap().clone().map_err(|m| api_error(&m))
    }

    async fn list_tasks(&self, query: &ListQuery) -> Result<TaskList, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let tasks = self.list.lock().unwrap().clone().map_err(|m| api_error(&m))?;
        let tasks: Vec<Task> = tasks.into_iter().take(query.limit as usize).collect();
        Ok(TaskList {
            total: tasks.len() as u64,
            tasks,
        })
    }

    async fn task_detail(&self, task_id: &str) -> Result<Task, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.detail_log.lock().unwrap().push(task_id.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.detail_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.details
            .lock()
            .unwrap()
            .get(task_id)
            .cloned()
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: "Task not found".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn healthy() -> ServerHealth {
    ServerHealth {
        status: HealthStatus::Healthy,
        worker_running: true,
        current_task: None,
        timestamp: None,
    }
}

pub fn summary(id: &str, status: TaskStatus) -> Task {
    Task::new(id, status)
}

pub fn running_with_progress(id: &str, percent: f64) -> Task {
    let mut task = Task::new(id, TaskStatus::Running);
    task.progress = Some(TaskProgress::overall(percent));
    task
}

/// A full detail record as the progress endpoint returns it.
pub fn detail(id: &str, status: TaskStatus) -> Task {
    let mut task = Task::new(id, status);
    task.config = Some(TrainingConfig {
        num_classes: Some(10),
        epochs: Some(3),
        ..Default::default()
    });
    task.results = Some(json!({ "accuracy": 0.93 }));
    task.progress = Some(TaskProgress::overall(100.0));
    task.started_at = Some("2024-01-01T00:00:00Z".parse().unwrap());
    task.completed_at = Some("2024-01-01T01:00:00Z".parse().unwrap());
    task
}

pub async fn seeded_store(tasks: Vec<Task>) -> (Arc<TaskStore>, StoreWriter) {
    let store = Arc::new(TaskStore::new());
    let writer = store.writer();
    writer.merge_list(tasks).await;
    (store, writer)
}
