//! Health record of the remote training service.

use serde::{Deserialize, Serialize};

use crate::types::{lenient_timestamp, TaskId, Timestamp};

/// Anything other than `healthy` or `unhealthy` decodes as `Unknown`, which
/// reads as offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    #[serde(other)]
    Unknown,
}

/// Response body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerHealth {
    pub status: HealthStatus,
    /// Whether the service's training worker loop is alive.
    #[serde(default)]
    pub worker_running: bool,
    /// Task the worker is executing right now, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<TaskId>,
    #[serde(default, with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl ServerHealth {
    /// `true` when the service reports itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Coarse connectivity derived from an optional health record.
///
/// A missing record (never fetched, or cleared by a failed check) reads as
/// offline even if an earlier check was healthy.
pub fn is_online(health: Option<&ServerHealth>) -> bool {
    health.is_some_and(ServerHealth::is_healthy)
}
