//! Pipeline Repository
//!
//! Handles all store operations related to pipelines.

use chrono::Utc;
use delivery_core::domain::pipeline::Pipeline;
use uuid::Uuid;

use super::Store;

/// Store a new pipeline
pub fn create(store: &Store, pipeline: Pipeline) -> Pipeline {
    store.pipelines.write().insert(pipeline.clone());
    pipeline
}

/// Find a pipeline by ID
pub fn find_by_id(store: &Store, id: Uuid) -> Option<Pipeline> {
    store.pipelines.read().get(id)
}

/// List all pipelines in creation order
pub fn list_all(store: &Store) -> Vec<Pipeline> {
    store.pipelines.read().values().cloned().collect()
}

/// Replace a stored pipeline wholesale
///
/// `updated_at` is always stamped with the current time. Returns `None` if no
/// pipeline with that id exists.
pub fn update(store: &Store, mut pipeline: Pipeline) -> Option<Pipeline> {
    pipeline.updated_at = Utc::now();
    store.pipelines.write().replace(pipeline)
}

/// Delete a pipeline. Runs that reference it are left alone.
pub fn delete(store: &Store, id: Uuid) -> bool {
    store.pipelines.write().remove(id)
}
