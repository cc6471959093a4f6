//! Run Repository
//!
//! Handles all store operations related to runs.

use delivery_core::domain::run::Run;
use uuid::Uuid;

use super::Store;

/// Store a new run
pub fn create(store: &Store, run: Run) -> Run {
    store.runs.write().insert(run.clone());
    run
}

/// Find a run by ID
pub fn find_by_id(store: &Store, id: Uuid) -> Option<Run> {
    store.runs.read().get(id)
}

/// List all runs in creation order
pub fn list_all(store: &Store) -> Vec<Run> {
    store.runs.read().values().cloned().collect()
}

/// List the runs of a pipeline in creation order
///
/// Works for deleted pipelines too, since runs outlive them.
pub fn find_by_pipeline(store: &Store, pipeline_id: Uuid) -> Vec<Run> {
    store
        .runs
        .read()
        .values()
        .filter(|run| run.pipeline_id == pipeline_id)
        .cloned()
        .collect()
}

/// Persist the current state of a run. Returns `None` if it was never stored.
pub fn update(store: &Store, run: Run) -> Option<Run> {
    store.runs.write().replace(run)
}

/// Delete a run
pub fn delete(store: &Store, id: Uuid) -> bool {
    store.runs.write().remove(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_core::domain::run::RunStatus;

    #[test]
    fn test_create_find_update() {
        let store = Store::new();
        let mut run = create(&store, Run::new(Uuid::new_v4()));

        run.status = RunStatus::Running;
        run.logs.push("started".to_string());
        update(&store, run.clone()).unwrap();

        let stored = find_by_id(&store, run.id).unwrap();
        assert_eq!(stored.status, RunStatus::Running);
        assert_eq!(stored.logs, vec!["started"]);
    }

    #[test]
    fn test_update_unknown_run() {
        let store = Store::new();
        assert!(update(&store, Run::new(Uuid::new_v4())).is_none());
    }

    #[test]
    fn test_find_by_pipeline() {
        let store = Store::new();
        let pipeline_a = Uuid::new_v4();
        let pipeline_b = Uuid::new_v4();

        let first = create(&store, Run::new(pipeline_a));
        create(&store, Run::new(pipeline_b));
        let third = create(&store, Run::new(pipeline_a));

        let ids: Vec<Uuid> = find_by_pipeline(&store, pipeline_a)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![first.id, third.id]);
        assert!(find_by_pipeline(&store, Uuid::new_v4()).is_empty());
    }

    #[test]
    fn test_list_all_is_a_snapshot() {
        let store = Store::new();
        let first = create(&store, Run::new(Uuid::new_v4()));
        let second = create(&store, Run::new(Uuid::new_v4()));

        let listed = list_all(&store);

        let mut changed = first.clone();
        changed.status = RunStatus::Failed;
        update(&store, changed).unwrap();

        assert_eq!(listed, vec![first.clone(), second.clone()]);
        assert_eq!(list_all(&store)[0].status, RunStatus::Failed);
    }

    #[test]
    fn test_delete() {
        let store = Store::new();
        let run = create(&store, Run::new(Uuid::new_v4()));
        let kept = create(&store, Run::new(run.pipeline_id));

        assert!(delete(&store, run.id));
        assert!(!delete(&store, run.id));
        assert!(find_by_id(&store, run.id).is_none());
        assert!(update(&store, run.clone()).is_none());
        assert_eq!(list_all(&store), vec![kept.clone()]);
        assert_eq!(find_by_pipeline(&store, run.pipeline_id), vec![kept]);
    }
}
