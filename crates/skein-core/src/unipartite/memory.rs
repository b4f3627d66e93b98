//! In-memory unipartite graph store.
//!
//! Vertices and adjacency live behind a single reader/writer lock.
//! `add_undirected` holds the write lock across both half-edge inserts so
//! concurrent callers can never observe (or leave behind) half of an
//! undirected edge.

use crate::types::{EntityId, EntityIdSet, SkeinError, validate_id};
use crate::unipartite::UnipartiteStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Interior maps guarded by the store lock.
#[derive(Debug, Default)]
struct UnipartiteData {
    /// Standalone vertices.
    vertices: EntityIdSet,
    /// Directed adjacency: source -> destinations.
    adjacency: BTreeMap<EntityId, EntityIdSet>,
}

impl UnipartiteData {
    fn contains(&self, id: &EntityId) -> bool {
        self.vertices.contains(id) || self.adjacency.contains_key(id)
    }

    fn insert_directed(&mut self, src: &EntityId, dst: &EntityId) {
        self.adjacency
            .entry(src.clone())
            .or_default()
            .insert(dst.clone());
    }
}

/// In-memory implementation of [`UnipartiteStore`].
#[derive(Debug, Default)]
pub struct InMemoryUnipartiteStore {
    inner: RwLock<UnipartiteData>,
}

impl InMemoryUnipartiteStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnipartiteStore for InMemoryUnipartiteStore {
    fn add_entity(&self, id: &EntityId) -> Result<(), SkeinError> {
        validate_id(id.as_str())?;
        self.inner.write().vertices.insert(id.clone());
        Ok(())
    }

    fn add_directed(&self, src: &EntityId, dst: &EntityId) -> Result<(), SkeinError> {
        validate_id(src.as_str())?;
        validate_id(dst.as_str())?;
        if src == dst {
            return Err(SkeinError::SelfLoop(src.clone()));
        }

        self.inner.write().insert_directed(src, dst);
        Ok(())
    }

    fn add_undirected(&self, first: &EntityId, second: &EntityId) -> Result<(), SkeinError> {
        validate_id(first.as_str())?;
        validate_id(second.as_str())?;
        if first == second {
            return Err(SkeinError::SelfLoop(first.clone()));
        }

        // One write-lock acquisition covers both directions.
        let mut data = self.inner.write();
        data.insert_directed(first, second);
        data.insert_directed(second, first);
        Ok(())
    }

    fn edge_exists(&self, src: &EntityId, dst: &EntityId) -> Result<bool, SkeinError> {
        Ok(self
            .inner
            .read()
            .adjacency
            .get(src)
            .is_some_and(|destinations| destinations.contains(dst)))
    }

    fn adjacent(&self, id: &EntityId) -> Result<EntityIdSet, SkeinError> {
        let data = self.inner.read();
        if !data.contains(id) {
            return Err(SkeinError::EntityNotFound(id.clone()));
        }
        Ok(data.adjacency.get(id).cloned().unwrap_or_default())
    }

    fn entity_ids(&self) -> Result<EntityIdSet, SkeinError> {
        let data = self.inner.read();
        let mut ids = data.vertices.clone();
        ids.extend(data.adjacency.keys().cloned());
        Ok(ids)
    }

    fn has_entity(&self, id: &EntityId) -> Result<bool, SkeinError> {
        Ok(self.inner.read().contains(id))
    }

    fn number_of_entities(&self) -> Result<usize, SkeinError> {
        Ok(self.entity_ids()?.len())
    }

    fn clear(&self) -> Result<(), SkeinError> {
        let mut data = self.inner.write();
        data.vertices.clear();
        data.adjacency.clear();
        Ok(())
    }

    fn finalise(&self) -> Result<(), SkeinError> {
        Ok(())
    }

    fn close(self) -> Result<(), SkeinError> {
        Ok(())
    }

    fn destroy(self) -> Result<(), SkeinError> {
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
