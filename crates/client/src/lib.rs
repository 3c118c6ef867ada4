//! HTTP client for the remote training service.
//!
//! [`TrainingApi`] wraps the service's REST endpoints (health, task list,
//! task progress, delete, start training). [`TaskSource`] is the narrow
//! read-only view of it that the synchronization layer depends on.

pub mod api;
pub mod source;

pub use api::{ApiError, TrainingApi};
pub use source::TaskSource;
