//! Domain model and pure reconciliation logic for training-task sync.
//!
//! Everything in this crate is synchronous and I/O free: task and health
//! records as the remote training service reports them, the list merge,
//! detail patching, derived queue statistics, and polling configuration.

pub mod error;
pub mod health;
pub mod merge;
pub mod polling;
pub mod stats;
pub mod task;
pub mod training;
pub mod types;
