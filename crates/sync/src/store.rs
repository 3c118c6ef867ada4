//! The in-memory task set, health record and error indicator.
//!
//! Reads are available to anyone holding the [`TaskStore`]. Writes go
//! through a [`StoreWriter`], which is bound to one *epoch*: the poller
//! opens a new epoch on every start and retires it on stop, and a writer
//! whose epoch is no longer current has its mutations discarded. Each named
//! mutation runs under a single write guard, so concurrent streams never
//! observe a half-applied update; the order in which their results land is
//! still completion order, last write wins per field.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use trainsync_core::health::{self, ServerHealth};
use trainsync_core::merge::{merge_tasks, patch_from_detail, PatchScope};
use trainsync_core::stats::QueueStats;
use trainsync_core::task::{Task, TaskStatus};
use trainsync_core::types::TaskId;

use crate::error_state::ErrorState;
use crate::streams::Stream;

/// Point-in-time copy of everything the store holds.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub tasks: Vec<Task>,
    pub health: Option<ServerHealth>,
    pub error: ErrorState,
}

#[derive(Debug, Default)]
pub struct TaskStore {
    state: RwLock<StoreSnapshot>,
    epoch: AtomicU64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- reads ----

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.clone()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn task(&self, task_id: &str) -> Option<Task> {
        self.state
            .read()
            .await
            .tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .cloned()
    }

    pub async fn health(&self) -> Option<ServerHealth> {
        self.state.read().await.health.clone()
    }

    /// `false` whenever the last health check failed or none has run.
    pub async fn is_online(&self) -> bool {
        health::is_online(self.state.read().await.health.as_ref())
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.message().map(str::to_string)
    }

    pub async fn error_state(&self) -> ErrorState {
        self.state.read().await.error.clone()
    }

    /// Counts by status, computed from the current task set.
    pub async fn queue_stats(&self) -> QueueStats {
        QueueStats::from_tasks(&self.state.read().await.tasks)
    }

    /// Ids of tasks that still need their detail fields fetched.
    pub async fn hydration_candidates(&self) -> Vec<TaskId> {
        self.state
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| t.needs_hydration())
            .map(|t| t.task_id.clone())
            .collect()
    }

    pub async fn running_task_ids(&self) -> Vec<TaskId> {
        self.state
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Running)
            .map(|t| t.task_id.clone())
            .collect()
    }

    // ---- epochs ----

    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// A writer bound to the current epoch.
    ///
    /// Does not invalidate anyone. For a store with no [`Poller`](crate::Poller)
    /// attached; with one running, go through
    /// [`Poller::refresh`](crate::Poller::refresh) instead. The writer goes
    /// stale as soon as a poller starts or stops.
    pub fn writer(self: &Arc<Self>) -> StoreWriter {
        StoreWriter {
            store: Arc::clone(self),
            epoch: self.current_epoch(),
        }
    }

    /// Open a new epoch, invalidating every existing writer, and return a
    /// writer bound to it.
    pub(crate) async fn begin_epoch(self: &Arc<Self>) -> StoreWriter {
        let _guard = self.state.write().await;
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        StoreWriter {
            store: Arc::clone(self),
            epoch,
        }
    }

    /// Invalidate every existing writer without handing out a new one.
    ///
    /// Waits for any mutation already holding the write guard, so nothing
    /// from the retired epoch lands after this returns.
    pub(crate) async fn retire_epoch(&self) {
        let _guard = self.state.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}

/// Write handle bound to one store epoch.
#[derive(Debug, Clone)]
pub struct StoreWriter {
    store: Arc<TaskStore>,
    epoch: u64,
}

impl StoreWriter {
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether mutations through this writer will still be applied.
    pub fn is_current(&self) -> bool {
        self.store.current_epoch() == self.epoch
    }

    /// Replace the task set with `snapshot` merged over what is known.
    pub async fn merge_list(&self, snapshot: Vec<Task>) -> bool {
        self.mutate(|state| {
            state.tasks = merge_tasks(&state.tasks, snapshot);
        })
        .await
        .is_some()
    }

    /// Patch one task from a detail response. Returns `false` if the task
    /// is no longer in the set or the writer is stale.
    pub async fn patch_task(&self, task_id: &str, detail: Task, scope: PatchScope) -> bool {
        self.mutate(|state| match state.tasks.iter_mut().find(|t| t.task_id == task_id) {
            Some(task) => {
                patch_from_detail(task, detail, scope);
                true
            }
            None => false,
        })
        .await
        .unwrap_or(false)
    }

    /// Store a successful health check and clear a connectivity error.
    pub async fn record_health(&self, health: ServerHealth) -> bool {
        self.mutate(|state| {
            state.health = Some(health);
            if state.error.clear_if_health_related() {
                tracing::info!("Training service reachable again, error cleared");
            }
        })
        .await
        .is_some()
    }

    /// Forget the health record and show `message`.
    pub async fn record_health_failure(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        self.mutate(|state| {
            state.health = None;
            state.error.raise(Stream::Health, message);
        })
        .await
        .is_some()
    }

    pub async fn raise_error(&self, origin: Stream, message: impl Into<String>) -> bool {
        let message = message.into();
        self.mutate(|state| state.error.raise(origin, message))
            .await
            .is_some()
    }

    /// Clear the current error if `origin` raised it.
    pub async fn clear_error_from(&self, origin: Stream) -> bool {
        self.mutate(|state| state.error.clear_from(origin))
            .await
            .unwrap_or(false)
    }

    async fn mutate<R>(&self, apply: impl FnOnce(&mut StoreSnapshot) -> R) -> Option<R> {
        let mut state = self.store.state.write().await;
        if self.store.current_epoch() != self.epoch {
            tracing::debug!(
                epoch = self.epoch,
                current = self.store.current_epoch(),
                "Discarding write from retired poller run",
            );
            return None;
        }
        Some(apply(&mut state))
    }
}
