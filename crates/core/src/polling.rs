//! Polling intervals for the three refresh streams.

use std::time::Duration;

use crate::error::CoreError;

/// Default interval between health checks.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_millis(30_000);

/// Default interval between task list refreshes.
pub const DEFAULT_TASKS_INTERVAL: Duration = Duration::from_millis(15_000);

/// Default interval between progress refreshes of running tasks.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(1_000);

/// Intervals used by the poller, one per stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub health_interval: Duration,
    pub tasks_interval: Duration,
    pub progress_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            health_interval: DEFAULT_HEALTH_INTERVAL,
            tasks_interval: DEFAULT_TASKS_INTERVAL,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Partial update applied with [`PollingConfig::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollingConfigPatch {
    pub health_interval: Option<Duration>,
    pub tasks_interval: Option<Duration>,
    pub progress_interval: Option<Duration>,
}

impl PollingConfig {
    /// Load intervals from environment variables with defaults.
    ///
    /// | Env Var                          | Default  |
    /// |----------------------------------|----------|
    /// | `TRAINSYNC_HEALTH_INTERVAL_MS`   | `30000`  |
    /// | `TRAINSYNC_TASKS_INTERVAL_MS`    | `15000`  |
    /// | `TRAINSYNC_PROGRESS_INTERVAL_MS` | `1000`   |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary
    /// key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: Duration| -> Result<Duration, CoreError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| CoreError::Config(format!("{key} must be a valid u64, got {raw:?}"))),
            }
        };

        let config = Self {
            health_interval: read("TRAINSYNC_HEALTH_INTERVAL_MS", DEFAULT_HEALTH_INTERVAL)?,
            tasks_interval: read("TRAINSYNC_TASKS_INTERVAL_MS", DEFAULT_TASKS_INTERVAL)?,
            progress_interval: read("TRAINSYNC_PROGRESS_INTERVAL_MS", DEFAULT_PROGRESS_INTERVAL)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject zero intervals, which would make a stream spin.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, interval) in [
            ("health_interval", self.health_interval),
            ("tasks_interval", self.tasks_interval),
            ("progress_interval", self.progress_interval),
        ] {
            if interval.is_zero() {
                return Err(CoreError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    /// Return a copy with every field set in `patch` replaced.
    pub fn apply(&self, patch: PollingConfigPatch) -> Self {
        Self {
            health_interval: patch.health_interval.unwrap_or(self.health_interval),
            tasks_interval: patch.tasks_interval.unwrap_or(self.tasks_interval),
            progress_interval: patch.progress_interval.unwrap_or(self.progress_interval),
        }
    }
}
