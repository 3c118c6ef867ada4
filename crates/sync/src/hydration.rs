//! Batch fetching of full detail for summary-only tasks.
//!
//! The list endpoint omits `config` and `results`. After each successful
//! list merge, every non-running task still missing `config.num_classes` or
//! `results` is fetched from the progress endpoint, three at a time. A
//! batch must fully settle before the next one starts, which caps in-flight
//! detail requests at [`HYDRATION_BATCH_SIZE`].
//!
//! Failures are logged and otherwise ignored. The task stays a candidate and
//! is tried again after the next list refresh; there is no give-up policy.

use futures::future::join_all;
use trainsync_client::TaskSource;
use trainsync_core::merge::PatchScope;

use crate::store::StoreWriter;

/// Maximum number of concurrent detail requests issued by one hydration run.
pub const HYDRATION_BATCH_SIZE: usize = 3;

/// Outcome counts of one hydration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub candidates: usize,
    pub hydrated: usize,
    pub failed: usize,
}

enum Outcome {
    Hydrated,
    /// The task left the store, or the writer was retired, before the
    /// response arrived.
    Discarded,
    Failed,
}

/// Hydrate every current candidate in the store.
pub async fn hydrate(source: &dyn TaskSource, writer: &StoreWriter) -> HydrationReport {
    let candidates = writer.store().hydration_candidates().await;
    let mut report = HydrationReport {
        candidates: candidates.len(),
        ..Default::default()
    };
    if candidates.is_empty() {
        return report;
    }

    tracing::debug!(count = candidates.len(), "Hydrating task details");

    for batch in candidates.chunks(HYDRATION_BATCH_SIZE) {
        if !writer.is_current() {
            break;
        }

        let outcomes = join_all(batch.iter().map(|task_id| hydrate_one(source, writer, task_id))).await;

        for outcome in outcomes {
            match outcome {
                Outcome::Hydrated => report.hydrated += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Discarded => {}
            }
        }
    }

    tracing::debug!(
        candidates = report.candidates,
        hydrated = report.hydrated,
        failed = report.failed,
        "Hydration finished",
    );
    report
}

async fn hydrate_one(source: &dyn TaskSource, writer: &StoreWriter, task_id: &str) -> Outcome {
    match source.task_detail(task_id).await {
        Ok(detail) => {
            if writer.patch_task(task_id, detail, PatchScope::Hydration).await {
                Outcome::Hydrated
            } else {
                Outcome::Discarded
            }
        }
        Err(e) => {
            tracing::warn!(task_id, error = %e, "Failed to hydrate task details");
            Outcome::Failed
        }
    }
}
