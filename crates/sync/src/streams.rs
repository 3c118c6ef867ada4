//! One tick of each polling stream.
//!
//! These are the callbacks the [`Poller`](crate::Poller) runs on its timers.
//! To force a refresh of a running poller, e.g. right after deleting a task,
//! use [`Poller::refresh`](crate::Poller::refresh). Calling these directly
//! is for a store driven without a poller, through
//! [`TaskStore::writer`](crate::TaskStore::writer).

use std::sync::Arc;

use trainsync_client::TaskSource;
use trainsync_core::task::ListQuery;

use crate::hydration::{hydrate, HydrationReport};
use crate::progress::{refresh_progress, ProgressReport};
use crate::store::StoreWriter;

/// The three independent polling streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Health,
    Tasks,
    Progress,
}

impl Stream {
    pub const ALL: [Stream; 3] = [Stream::Health, Stream::Tasks, Stream::Progress];

    pub fn name(self) -> &'static str {
        match self {
            Stream::Health => "health",
            Stream::Tasks => "tasks",
            Stream::Progress => "progress",
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single tick, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Health { online: bool },
    Tasks { listed: Option<usize>, hydration: Option<HydrationReport> },
    Progress(ProgressReport),
}

/// Check service health.
///
/// On failure the health record is dropped, so the service reads as offline
/// even if the previous check was healthy.
pub async fn refresh_health(source: &dyn TaskSource, writer: &StoreWriter) -> bool {
    match source.health().await {
        Ok(health) => {
            let online = health.is_healthy();
            tracing::debug!(online, worker_running = health.worker_running, "Health check ok");
            writer.record_health(health).await;
            online
        }
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            writer
                .record_health_failure(format!("Health check failed: {e}"))
                .await;
            false
        }
    }
}

/// Fetch the task list, merge it into the store, then hydrate.
///
/// A failed fetch shows its message but leaves the known tasks untouched.
/// Returns the number of tasks listed and the hydration report, or `None`
/// for both if the list could not be fetched or applied.
pub async fn refresh_tasks(
    source: &dyn TaskSource,
    writer: &StoreWriter,
    query: &ListQuery,
) -> (Option<usize>, Option<HydrationReport>) {
    let list = match source.list_tasks(query).await {
        Ok(list) => list,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch task list");
            writer.raise_error(Stream::Tasks, e.to_string()).await;
            return (None, None);
        }
    };

    let listed = list.tasks.len();
    tracing::debug!(listed, total = list.total, "Task list fetched");

    if !writer.merge_list(list.tasks).await {
        return (None, None);
    }
    writer.clear_error_from(Stream::Tasks).await;

    let report = hydrate(source, writer).await;
    (Some(listed), Some(report))
}

/// Run one tick of `stream`.
pub async fn tick(
    stream: Stream,
    source: &Arc<dyn TaskSource>,
    writer: &StoreWriter,
    query: &ListQuery,
) -> TickOutcome {
    match stream {
        Stream::Health => TickOutcome::Health {
            online: refresh_health(source.as_ref(), writer).await,
        },
        Stream::Tasks => {
            let (listed, hydration) = refresh_tasks(source.as_ref(), writer, query).await;
            TickOutcome::Tasks { listed, hydration }
        }
        Stream::Progress => TickOutcome::Progress(refresh_progress(Arc::clone(source), writer).await),
    }
}
