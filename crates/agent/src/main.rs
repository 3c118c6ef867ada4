//! `trainsync-agent` -- keeps a local view of a remote training service.
//!
//! Polls service health, the task list and the progress of running tasks,
//! and logs a queue summary at a fixed interval until Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable                         | Required | Default | Description                          |
//! |----------------------------------|----------|---------|--------------------------------------|
//! | `TRAINING_API_URL`               | yes      | --      | Base URL, e.g. `http://host:8000`    |
//! | `STATUS_LOG_INTERVAL_SECS`       | no       | `10`    | Seconds between status log lines     |
//! | `TRAINING_API_TIMEOUT_SECS`      | no       | `30`    | Per-request timeout                  |
//! | `TRAINSYNC_HEALTH_INTERVAL_MS`   | no       | `30000` | Health poll interval                 |
//! | `TRAINSYNC_TASKS_INTERVAL_MS`    | no       | `15000` | Task list poll interval              |
//! | `TRAINSYNC_PROGRESS_INTERVAL_MS` | no       | `1000`  | Running-task progress poll interval  |

use std::sync::Arc;
use std::time::Duration;

use trainsync_agent::status::StatusReport;
use trainsync_client::TrainingApi;
use trainsync_core::polling::PollingConfig;
use trainsync_sync::{Poller, TaskStore};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default interval between status log lines.
const DEFAULT_STATUS_INTERVAL_SECS: u64 = 10;

/// Default per-request timeout against the training service.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trainsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_url = std::env::var("TRAINING_API_URL").unwrap_or_else(|_| {
        tracing::error!("TRAINING_API_URL environment variable is required");
        std::process::exit(1);
    });

    let config = PollingConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid polling configuration");
        std::process::exit(1);
    });

    let status_secs: u64 = std::env::var("STATUS_LOG_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_STATUS_INTERVAL_SECS);

    let timeout_secs: u64 = std::env::var("TRAINING_API_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

    tracing::info!(
        api_url = %api_url,
        health_ms = config.health_interval.as_millis() as u64,
        tasks_ms = config.tasks_interval.as_millis() as u64,
        progress_ms = config.progress_interval.as_millis() as u64,
        status_secs,
        timeout_secs,
        "Starting trainsync-agent",
    );

    let api = TrainingApi::new(api_url).with_timeout(Duration::from_secs(timeout_secs));
    let store = Arc::new(TaskStore::new());
    let poller = Poller::new(Arc::new(api), Arc::clone(&store), config);
    poller.start().await;

    let mut status = tokio::time::interval(Duration::from_secs(status_secs));
    // The first tick fires immediately, before any stream has reported.
    status.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Received Ctrl-C");
                break;
            }
            _ = status.tick() => {
                StatusReport::capture(&store).await.log();
            }
        }
    }

    poller.shutdown().await;
}
