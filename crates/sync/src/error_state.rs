//! The single user-visible error indicator.
//!
//! Holds at most one message at a time, never a history. The message is
//! tagged with the stream that raised it so a consumer can tell a health
//! outage from a task-list failure, but the clearing rules below are what
//! decide when it goes away.

use crate::streams::Stream;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    current: Option<RaisedError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RaisedError {
    origin: Stream,
    message: String,
}

impl ErrorState {
    pub fn message(&self) -> Option<&str> {
        self.current.as_ref().map(|e| e.message.as_str())
    }

    /// Stream that raised the current error.
    pub fn origin(&self) -> Option<Stream> {
        self.current.as_ref().map(|e| e.origin)
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }

    /// Replace whatever is shown with `message`.
    pub fn raise(&mut self, origin: Stream, message: impl Into<String>) {
        self.current = Some(RaisedError {
            origin,
            message: message.into(),
        });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Called after a successful health check. Clears the error only when
    /// its text looks connectivity related; anything else stays visible.
    pub fn clear_if_health_related(&mut self) -> bool {
        match self.message() {
            Some(message) if is_health_related(message) => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    /// Clear the error if `origin` raised it.
    pub fn clear_from(&mut self, origin: Stream) -> bool {
        if self.origin() == Some(origin) {
            self.clear();
            true
        } else {
            false
        }
    }
}

/// Whether an error message mentions health or fetching, case-insensitively.
pub fn is_health_related(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("health") || lower.contains("fetch")
}
