//! Queue statistics derived from the current task set.
//!
//! Never stored: callers compute a fresh [`QueueStats`] whenever they need
//! one, so it cannot drift from the tasks it summarises.

use serde::Serialize;

use crate::task::{Task, TaskStatus};
use crate::types::TaskId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    /// First running task in list order.
    pub running_task_id: Option<TaskId>,
}

impl QueueStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut stats = QueueStats {
            total: tasks.len(),
            ..Default::default()
        };

        for task in tasks {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Running => {
                    stats.running += 1;
                    if stats.running_task_id.is_none() {
                        stats.running_task_id = Some(task.task_id.clone());
                    }
                }
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
                TaskStatus::Unknown => {}
            }
        }

        stats
    }
}
