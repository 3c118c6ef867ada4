//! Per-tick refresh of running tasks.
//!
//! Every running task gets its own detail request, all issued at once with
//! no cap; the service's scheduler normally runs a single task at a time.
//! With nothing running, a tick makes no requests.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::task::AbortOnDropHandle;
use trainsync_client::TaskSource;
use trainsync_core::merge::PatchScope;
use trainsync_core::types::TaskId;

use crate::store::StoreWriter;
use crate::streams::Stream;

/// Shown when the refresh could not be dispatched at all.
pub const PROGRESS_DISPATCH_FAILED: &str = "Failed to refresh task progress";

/// Outcome counts of one progress tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressReport {
    pub running: usize,
    pub refreshed: usize,
    pub failed: usize,
}

/// Re-fetch every running task and patch status, progress, results and
/// timestamps back into the store.
///
/// Individual failures are dropped silently. Only a failure of the dispatch
/// itself (the request batch panicking or being aborted) raises the shared
/// error, and the next dispatch that completes clears it again.
pub async fn refresh_progress(source: Arc<dyn TaskSource>, writer: &StoreWriter) -> ProgressReport {
    let running = writer.store().running_task_ids().await;
    if running.is_empty() {
        return ProgressReport::default();
    }

    let batch_writer = writer.clone();
    let dispatch = AbortOnDropHandle::new(tokio::spawn(async move {
        refresh_all(source.as_ref(), &batch_writer, running).await
    }));

    match dispatch.await {
        Ok(report) => {
            writer.clear_error_from(Stream::Progress).await;
            report
        }
        Err(e) => {
            tracing::error!(error = %e, "Progress refresh dispatch failed");
            writer.raise_error(Stream::Progress, PROGRESS_DISPATCH_FAILED).await;
            ProgressReport::default()
        }
    }
}

async fn refresh_all(source: &dyn TaskSource, writer: &StoreWriter, running: Vec<TaskId>) -> ProgressReport {
    let mut report = ProgressReport {
        running: running.len(),
        ..Default::default()
    };

    let outcomes = join_all(running.iter().map(|task_id| async move {
        match source.task_detail(task_id).await {
            Ok(detail) => Ok(writer.patch_task(task_id, detail, PatchScope::Progress).await),
            Err(e) => {
                tracing::debug!(task_id = %task_id, error = %e, "Progress fetch failed");
                Err(())
            }
        }
    }))
    .await;

    for outcome in outcomes {
        match outcome {
            Ok(true) => report.refreshed += 1,
            Ok(false) => {}
            Err(()) => report.failed += 1,
        }
    }

    report
}
