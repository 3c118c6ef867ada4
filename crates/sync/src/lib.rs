//! Client-side synchronization of remote training-task state.
//!
//! The remote training service has no push channel, so three independent
//! polling streams keep a local [`TaskStore`] current:
//!
//! - **health**: [`streams::refresh_health`], drives the online indicator.
//! - **tasks**: [`streams::refresh_tasks`], merges the list snapshot and
//!   then [`hydration::hydrate`]s summary-only tasks in batches of three.
//! - **progress**: [`progress::refresh_progress`], re-fetches every running
//!   task.
//!
//! [`Poller`] owns the timers. All store mutation goes through a
//! [`StoreWriter`] bound to the poller run that created it, so writes from a
//! stopped run are discarded.

pub mod error_state;
pub mod hydration;
pub mod poller;
pub mod progress;
pub mod store;
pub mod streams;

pub use error_state::ErrorState;
pub use poller::Poller;
pub use store::{StoreWriter, TaskStore};
pub use streams::Stream;
