//! Reconciliation of task-list snapshots and detail responses.
//!
//! The list endpoint is cheap and authoritative for which tasks exist and
//! their coarse status. Detail fields (`config`, `results`, `progress`) are
//! expensive to obtain, so a summary-only refresh must never throw them away.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::task::Task;

/// Which fields a detail response is allowed to overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchScope {
    /// `config`, `results`, `started_at`, `completed_at`. Status is left to
    /// the list refresh.
    Hydration,
    /// `status`, `progress`, `results`, `started_at`, `completed_at`.
    Progress,
}

/// Reconcile a freshly fetched list snapshot against the known task set.
///
/// * Membership follows the snapshot exactly: ids not in `snapshot` are
///   dropped, and output order is snapshot order.
/// * For ids already known, the entry is the field-wise union of old and new
///   with new values winning. A field the snapshot omits (or sends as
///   `null`) keeps its previous value; this is what keeps `progress` alive
///   across summary-only refreshes.
/// * Duplicate ids inside `snapshot` collapse into one entry at the position
///   of their first occurrence.
pub fn merge_tasks(current: &[Task], snapshot: Vec<Task>) -> Vec<Task> {
    let mut known: HashMap<&str, &Task> = current
        .iter()
        .map(|task| (task.task_id.as_str(), task))
        .collect();

    let mut merged: Vec<Task> = Vec::with_capacity(snapshot.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(snapshot.len());

    for incoming in snapshot {
        if let Some(&idx) = positions.get(&incoming.task_id) {
            merge_fields(&mut merged[idx], incoming);
            continue;
        }

        let entry = match known.remove(incoming.task_id.as_str()) {
            Some(previous) => {
                let mut entry = previous.clone();
                merge_fields(&mut entry, incoming);
                entry
            }
            None => incoming,
        };
        positions.insert(entry.task_id.clone(), merged.len());
        merged.push(entry);
    }

    merged
}

/// Overlay every populated field of `newer` onto `target`.
fn merge_fields(target: &mut Task, newer: Task) {
    target.status = newer.status;
    overlay(&mut target.task_type, newer.task_type);
    overlay(&mut target.created_at, newer.created_at);
    overlay(&mut target.started_at, newer.started_at);
    overlay(&mut target.completed_at, newer.completed_at);
    overlay(&mut target.config, newer.config);
    overlay(&mut target.progress, newer.progress);
    overlay(&mut target.results, newer.results);
    overlay_map(&mut target.extra, newer.extra);
}

/// Apply a full detail record to a known task, limited to `scope`.
///
/// Absent fields in `detail` never blank the target.
pub fn patch_from_detail(target: &mut Task, detail: Task, scope: PatchScope) {
    match scope {
        PatchScope::Hydration => {
            overlay(&mut target.config, detail.config);
        }
        PatchScope::Progress => {
            target.status = detail.status;
            overlay(&mut target.progress, detail.progress);
        }
    }
    overlay(&mut target.results, detail.results);
    overlay(&mut target.started_at, detail.started_at);
    overlay(&mut target.completed_at, detail.completed_at);
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn overlay_map(target: &mut Map<String, Value>, newer: Map<String, Value>) {
    for (key, value) in newer {
        if !value.is_null() {
            target.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::task::{TaskProgress, TaskStatus, TrainingConfig};

    fn task(id: &str, status: TaskStatus) -> Task {
        Task::new(id, status)
    }

    fn from_json(value: Value) -> Task {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn first_snapshot_into_empty_state() {
        let snapshot = vec![from_json(json!({
            "task_id": "t1",
            "status": "completed",
            "created_at": "2024-01-01T00:00:00Z",
        }))];

        let merged = merge_tasks(&[], snapshot);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].task_id, "t1");
        assert_eq!(merged[0].status, TaskStatus::Completed);
        assert!(merged[0].needs_hydration());
    }

    #[test]
    fn progress_survives_summary_refresh() {
        let mut previous = task("t1", TaskStatus::Running);
        previous.progress = Some(TaskProgress::overall(40.0));

        let merged = merge_tasks(&[previous], vec![task("t1", TaskStatus::Running)]);

        assert_eq!(merged[0].progress, Some(TaskProgress::overall(40.0)));
    }

    #[test]
    fn new_fields_overwrite_old_values() {
        let mut previous = task("t1", TaskStatus::Running);
        previous.progress = Some(TaskProgress::overall(40.0));
        previous.results = Some(json!({ "accuracy": 0.5 }));

        let mut incoming = task("t1", TaskStatus::Completed);
        incoming.results = Some(json!({ "accuracy": 0.9 }));

        let merged = merge_tasks(&[previous], vec![incoming]);

        assert_eq!(merged[0].status, TaskStatus::Completed);
        assert_eq!(merged[0].results, Some(json!({ "accuracy": 0.9 })));
        assert_eq!(merged[0].progress, Some(TaskProgress::overall(40.0)));
    }

    #[test]
    fn new_progress_replaces_old_progress() {
        let mut previous = task("t1", TaskStatus::Running);
        previous.progress = Some(TaskProgress::overall(40.0));
        let mut incoming = task("t1", TaskStatus::Running);
        incoming.progress = Some(TaskProgress::overall(75.0));

        let merged = merge_tasks(&[previous], vec![incoming]);

        assert_eq!(merged[0].progress, Some(TaskProgress::overall(75.0)));
    }

    #[test]
    fn hydrated_config_is_not_lost() {
        let mut previous = task("t1", TaskStatus::Completed);
        previous.config = Some(TrainingConfig {
            num_classes: Some(10),
            ..Default::default()
        });
        previous.results = Some(json!({ "accuracy": 0.9 }));

        let merged = merge_tasks(&[previous.clone()], vec![task("t1", TaskStatus::Completed)]);

        assert_eq!(merged[0], previous);
        assert!(!merged[0].needs_hydration());
    }

    #[test]
    fn absent_ids_are_dropped() {
        let current = vec![task("t1", TaskStatus::Completed), task("t2", TaskStatus::Failed)];

        let merged = merge_tasks(&current, vec![task("t2", TaskStatus::Failed)]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].task_id, "t2");
    }

    #[test]
    fn empty_snapshot_clears_everything() {
        let current = vec![task("t1", TaskStatus::Completed)];
        assert!(merge_tasks(&current, Vec::new()).is_empty());
    }

    #[test]
    fn output_follows_snapshot_order() {
        let current = vec![task("a", TaskStatus::Pending), task("b", TaskStatus::Pending)];
        let snapshot = vec![
            task("c", TaskStatus::Pending),
            task("b", TaskStatus::Pending),
            task("a", TaskStatus::Pending),
        ];

        let ids: Vec<_> = merge_tasks(&current, snapshot)
            .into_iter()
            .map(|t| t.task_id)
            .collect();

        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn merging_same_snapshot_twice_is_idempotent() {
        let mut previous = task("t1", TaskStatus::Running);
        previous.progress = Some(TaskProgress::overall(10.0));
        let snapshot = vec![
            from_json(json!({ "task_id": "t1", "status": "running", "queue": "gpu" })),
            from_json(json!({ "task_id": "t2", "status": "pending" })),
        ];

        let once = merge_tasks(&[previous], snapshot.clone());
        let twice = merge_tasks(&once, snapshot);

        assert_eq!(once, twice);
    }

    #[test]
    fn duplicate_ids_in_snapshot_collapse() {
        let mut first = task("t1", TaskStatus::Pending);
        first.progress = Some(TaskProgress::overall(5.0));
        let second = task("t1", TaskStatus::Running);

        let merged = merge_tasks(&[], vec![first, second]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].status, TaskStatus::Running);
        assert_eq!(merged[0].progress, Some(TaskProgress::overall(5.0)));
    }

    #[test]
    fn extra_fields_are_unioned() {
        let previous = from_json(json!({ "task_id": "t1", "status": "running", "node": "gpu-1" }));
        let incoming = from_json(json!({ "task_id": "t1", "status": "running", "eta": 30 }));

        let merged = merge_tasks(&[previous], vec![incoming]);

        assert_eq!(merged[0].extra["node"], json!("gpu-1"));
        assert_eq!(merged[0].extra["eta"], json!(30));
    }

    // -- patch_from_detail ----------------------------------------------------

    fn detail() -> Task {
        from_json(json!({
            "task_id": "t1",
            "status": "completed",
            "started_at": "2024-01-01T00:00:00Z",
            "completed_at": "2024-01-01T01:00:00Z",
            "config": { "num_classes": 3 },
            "progress": { "overall_progress": 100.0 },
            "results": { "accuracy": 0.97 },
        }))
    }

    #[test]
    fn hydration_patch_leaves_status_and_progress_alone() {
        let mut target = task("t1", TaskStatus::Pending);

        patch_from_detail(&mut target, detail(), PatchScope::Hydration);

        assert_eq!(target.status, TaskStatus::Pending);
        assert!(target.progress.is_none());
        assert_eq!(target.config.as_ref().and_then(|c| c.num_classes), Some(3));
        assert!(target.results.is_some());
        assert!(target.started_at.is_some());
        assert!(target.completed_at.is_some());
    }

    #[test]
    fn progress_patch_updates_status_and_progress() {
        let mut target = task("t1", TaskStatus::Running);

        patch_from_detail(&mut target, detail(), PatchScope::Progress);

        assert_eq!(target.status, TaskStatus::Completed);
        assert_eq!(target.progress, Some(TaskProgress::overall(100.0)));
        assert!(target.config.is_none());
        assert!(target.results.is_some());
    }

    #[test]
    fn patch_never_blanks_populated_fields() {
        let mut target = task("t1", TaskStatus::Running);
        target.progress = Some(TaskProgress::overall(40.0));
        target.results = Some(json!({ "partial": true }));

        patch_from_detail(&mut target, task("t1", TaskStatus::Running), PatchScope::Progress);

        assert_eq!(target.progress, Some(TaskProgress::overall(40.0)));
        assert_eq!(target.results, Some(json!({ "partial": true })));
    }
}
