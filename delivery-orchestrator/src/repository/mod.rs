//! Repository Module
//!
//! In-memory data access layer for the orchestrator.
//! Each repository handles store operations for a specific domain entity;
//! every read hands out a clone so callers never observe a half-applied write.

pub mod pipeline;
pub mod run;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use delivery_core::domain::pipeline::Pipeline;
use delivery_core::domain::run::Run;

// Re-export for convenience
pub use pipeline as pipeline_repository;
pub use run as run_repository;

/// Shared in-memory store
///
/// Cheap to clone: all clones share the same collections.
#[derive(Clone, Default)]
pub struct Store {
    pipelines: Arc<RwLock<Collection<Pipeline>>>,
    runs: Arc<RwLock<Collection<Run>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Anything keyed by a UUID
pub trait Entity: Clone {
    fn id(&self) -> Uuid;
}

impl Entity for Pipeline {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Entity for Run {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Id-indexed records that remember insertion order
struct Collection<T> {
    items: HashMap<Uuid, T>,
    order: Vec<Uuid>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    fn insert(&mut self, item: T) {
        let id = item.id();
        if self.items.insert(id, item).is_none() {
            self.order.push(id);
        }
    }

    fn get(&self, id: Uuid) -> Option<T> {
        self.items.get(&id).cloned()
    }

    /// Replace an existing record, leaving absent ids untouched
    fn replace(&mut self, item: T) -> Option<T> {
        let slot = self.items.get_mut(&item.id())?;
        *slot = item;
        Some(slot.clone())
    }

    fn remove(&mut self, id: Uuid) -> bool {
        if self.items.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|existing| *existing != id);
        true
    }

    fn values(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_keeps_insertion_order() {
        let mut runs = Collection::default();
        let pipeline_id = Uuid::new_v4();
        let first = Run::new(pipeline_id);
        let second = Run::new(pipeline_id);
        let third = Run::new(pipeline_id);

        runs.insert(first.clone());
        runs.insert(second.clone());
        runs.insert(third.clone());
        assert!(runs.remove(second.id));

        let ids: Vec<Uuid> = runs.values().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, third.id]);
    }

    #[test]
    fn test_collection_replace_requires_existing() {
        let mut runs = Collection::default();
        let run = Run::new(Uuid::new_v4());

        assert!(runs.replace(run.clone()).is_none());
        assert!(runs.get(run.id).is_none());

        runs.insert(run.clone());
        let mut changed = run.clone();
        changed.logs.push("hello".to_string());
        assert_eq!(runs.replace(changed).unwrap().logs, vec!["hello"]);
        assert!(!runs.remove(Uuid::new_v4()));
    }
}
