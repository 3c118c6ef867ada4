//! Timer ownership for the three polling streams.
//!
//! [`Poller`] spawns one task per [`Stream`]. Each task ticks immediately
//! and then at its configured interval, at a fixed cadence with no backoff,
//! until the run's [`CancellationToken`] is triggered.
//!
//! Every run opens a fresh store epoch. Stopping cancels the token, which
//! abandons any request still in flight, and retires the epoch, so a
//! response that races the shutdown cannot write into the store.
//!
//! [`Poller::refresh`] runs a tick out of band against the same epoch. Each
//! stream has a gate held for the duration of a tick, so a manual refresh
//! waits for a timer tick of the same stream and vice versa.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use trainsync_client::TaskSource;
use trainsync_core::error::CoreError;
use trainsync_core::polling::{PollingConfig, PollingConfigPatch};
use trainsync_core::task::ListQuery;

use crate::store::{StoreWriter, TaskStore};
use crate::streams::{self, Stream, TickOutcome};

/// How long [`Poller::shutdown`] waits for each stream task to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the polling timers and their start/stop lifecycle.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Poller {
    source: Arc<dyn TaskSource>,
    store: Arc<TaskStore>,
    list_query: ListQuery,
    inner: Mutex<PollerState>,
}

struct PollerState {
    config: PollingConfig,
    active: Option<ActiveRun>,
}

/// Bookkeeping for one started run.
struct ActiveRun {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    writer: StoreWriter,
    gates: Arc<StreamGates>,
}

/// One lock per stream; ticks of a stream never run concurrently.
#[derive(Default)]
struct StreamGates {
    health: Mutex<()>,
    tasks: Mutex<()>,
    progress: Mutex<()>,
}

impl StreamGates {
    fn gate(&self, stream: Stream) -> &Mutex<()> {
        match stream {
            Stream::Health => &self.health,
            Stream::Tasks => &self.tasks,
            Stream::Progress => &self.progress,
        }
    }
}

impl Poller {
    pub fn new(source: Arc<dyn TaskSource>, store: Arc<TaskStore>, config: PollingConfig) -> Self {
        Self {
            source,
            store,
            list_query: ListQuery::default(),
            inner: Mutex::new(PollerState {
                config,
                active: None,
            }),
        }
    }

    /// Use `query` for every task list refresh instead of the default.
    pub fn with_list_query(mut self, query: ListQuery) -> Self {
        self.list_query = query;
        self
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub async fn config(&self) -> PollingConfig {
        self.inner.lock().await.config
    }

    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.active.is_some()
    }

    /// Cancel any current run, then start all three streams. Each stream
    /// fetches immediately and then repeats at its interval.
    pub async fn start(&self) {
        let mut state = self.inner.lock().await;
        self.restart_locked(&mut state).await;
    }

    /// Cancel all timers. Safe to call when already stopped.
    pub async fn stop(&self) {
        let mut state = self.inner.lock().await;
        self.stop_locked(&mut state).await;
    }

    /// Merge `patch` into the configuration and restart so the new
    /// intervals take effect together. Starts the poller if it was stopped.
    pub async fn set_config(&self, patch: PollingConfigPatch) -> Result<PollingConfig, CoreError> {
        let mut state = self.inner.lock().await;
        let config = state.config.apply(patch);
        config.validate()?;
        state.config = config;

        tracing::info!(
            health_ms = config.health_interval.as_millis() as u64,
            tasks_ms = config.tasks_interval.as_millis() as u64,
            progress_ms = config.progress_interval.as_millis() as u64,
            "Polling configuration updated",
        );
        self.restart_locked(&mut state).await;
        Ok(config)
    }

    /// Run one tick of `stream` now, outside its timer.
    ///
    /// Waits for an in-progress tick of the same stream to finish first, so
    /// a manual task-list refresh never overlaps a timed one's hydration.
    /// Returns `None` when the poller is stopped.
    pub async fn refresh(&self, stream: Stream) -> Option<TickOutcome> {
        let (writer, gates) = {
            let state = self.inner.lock().await;
            let run = state.active.as_ref()?;
            (run.writer.clone(), Arc::clone(&run.gates))
        };

        let _gate = gates.gate(stream).lock().await;
        if !writer.is_current() {
            return None;
        }
        tracing::debug!(stream = stream.name(), "Manual refresh");
        Some(streams::tick(stream, &self.source, &writer, &self.list_query).await)
    }

    /// Stop, then wait up to 5 seconds per stream task for a clean exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down poller");
        let mut state = self.inner.lock().await;
        let Some(run) = state.active.take() else {
            return;
        };
        run.cancel.cancel();
        self.store.retire_epoch().await;

        for handle in run.handles {
            let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await;
        }
        tracing::info!("Poller shut down complete");
    }

    // ---- private helpers ----

    async fn restart_locked(&self, state: &mut PollerState) {
        self.stop_locked(state).await;

        let writer = self.store.begin_epoch().await;
        let cancel = CancellationToken::new();
        let gates = Arc::new(StreamGates::default());
        let config = state.config;

        let handles = Stream::ALL
            .into_iter()
            .map(|stream| {
                let period = interval_for(&config, stream);
                tokio::spawn(run_stream(
                    stream,
                    period,
                    Arc::clone(&self.source),
                    writer.clone(),
                    self.list_query,
                    Arc::clone(&gates),
                    cancel.clone(),
                ))
            })
            .collect();

        tracing::info!(epoch = writer.epoch(), "Polling started");
        state.active = Some(ActiveRun {
            cancel,
            handles,
            writer,
            gates,
        });
    }

    async fn stop_locked(&self, state: &mut PollerState) {
        let Some(run) = state.active.take() else {
            return;
        };
        run.cancel.cancel();
        self.store.retire_epoch().await;
        // Handles are dropped; the tasks exit on their next poll.
        drop(run.handles);
        tracing::info!("Polling stopped");
    }
}

fn interval_for(config: &PollingConfig, stream: Stream) -> Duration {
    match stream {
        Stream::Health => config.health_interval,
        Stream::Tasks => config.tasks_interval,
        Stream::Progress => config.progress_interval,
    }
}

/// Tick `stream` every `period` until `cancel` fires.
///
/// Ticks of one stream never overlap; a slow tick delays the next one
/// rather than bunching missed ticks together.
async fn run_stream(
    stream: Stream,
    period: Duration,
    source: Arc<dyn TaskSource>,
    writer: StoreWriter,
    query: ListQuery,
    gates: Arc<StreamGates>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(
        stream = stream.name(),
        period_ms = period.as_millis() as u64,
        "Polling stream armed",
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = async {
                let _gate = gates.gate(stream).lock().await;
                streams::tick(stream, &source, &writer, &query).await
            } => {
                tracing::trace!(stream = stream.name(), ?outcome, "Tick finished");
            }
        }
    }

    tracing::debug!(stream = stream.name(), "Polling stream stopped");
}
