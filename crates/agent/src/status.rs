//! Periodic status line for the daemon log.

use trainsync_core::health;
use trainsync_core::stats::QueueStats;
use trainsync_sync::store::StoreSnapshot;
use trainsync_sync::{Stream, TaskStore};

/// What the agent reports on each status interval.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub online: bool,
    pub worker_running: bool,
    pub stats: QueueStats,
    pub error: Option<String>,
    pub error_origin: Option<Stream>,
}

impl StatusReport {
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        Self {
            online: health::is_online(snapshot.health.as_ref()),
            worker_running: snapshot
                .health
                .as_ref()
                .is_some_and(|h| h.worker_running),
            stats: QueueStats::from_tasks(&snapshot.tasks),
            error: snapshot.error.message().map(str::to_string),
            error_origin: snapshot.error.origin(),
        }
    }

    pub async fn capture(store: &TaskStore) -> Self {
        Self::from_snapshot(&store.snapshot().await)
    }

    /// Emit one log line. Warns while an error is showing.
    pub fn log(&self) {
        let running_task = self.stats.running_task_id.as_deref().unwrap_or("-");
        if let Some(error) = &self.error {
            tracing::warn!(
                online = self.online,
                total = self.stats.total,
                running = self.stats.running,
                pending = self.stats.pending,
                origin = self.error_origin.map(Stream::name).unwrap_or("-"),
                error = %error,
                "Training service degraded",
            );
            return;
        }

        tracing::info!(
            online = self.online,
            worker_running = self.worker_running,
            total = self.stats.total,
            pending = self.stats.pending,
            running = self.stats.running,
            completed = self.stats.completed,
            failed = self.stats.failed,
            running_task,
            "Training queue status",
        );
    }
}
