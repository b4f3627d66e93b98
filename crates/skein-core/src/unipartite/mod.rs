//! # Unipartite Graph Store
//!
//! The unipartite store holds the one-mode projection of the corpus: a graph
//! over entity ids alone, where an edge means the two entities co-occur in at
//! least one document. Undirected edges are represented as two directed
//! half-edges.
//!
//! Two implementations share the [`UnipartiteStore`] contract:
//! - [`InMemoryUnipartiteStore`] — `RwLock`-guarded adjacency maps
//! - [`RedbUnipartiteStore`] — a single ordered redb table of marker keys
//!
//! [`UnipartiteBackend`] is the tagged selection over the two.

mod memory;
mod redb_store;

pub use memory::InMemoryUnipartiteStore;
pub use redb_store::RedbUnipartiteStore;

use crate::types::{EntityId, EntityIdSet, SkeinError};
use std::path::Path;

// =============================================================================
// STORE CONTRACT
// =============================================================================

/// Behavioral contract shared by all unipartite store implementations.
///
/// Vertex and edge inserts are idempotent upserts; re-adding is a no-op,
/// never an error. Self-loops are rejected with `SelfLoop`. An entity is
/// present when it was added as a standalone vertex or appears as the source
/// of a half-edge (undirected inserts write both directions, so every
/// endpoint of an undirected edge is a source).
pub trait UnipartiteStore {
    /// Insert a standalone vertex.
    fn add_entity(&self, id: &EntityId) -> Result<(), SkeinError>;

    /// Insert the directed half-edge `src -> dst`.
    fn add_directed(&self, src: &EntityId, dst: &EntityId) -> Result<(), SkeinError>;

    /// Insert the undirected edge between `first` and `second`.
    ///
    /// Equivalent to two directed inserts; implementations guarantee the two
    /// half-edges either both land or neither does, even under concurrent
    /// callers.
    fn add_undirected(&self, first: &EntityId, second: &EntityId) -> Result<(), SkeinError>;

    /// True when the directed half-edge `src -> dst` is stored.
    fn edge_exists(&self, src: &EntityId, dst: &EntityId) -> Result<bool, SkeinError>;

    /// The set of ids adjacent to `id`.
    ///
    /// Fails with `EntityNotFound` when `id` is not present in the store.
    fn adjacent(&self, id: &EntityId) -> Result<EntityIdSet, SkeinError>;

    /// Snapshot of all vertex ids (standalone vertices and edge sources).
    fn entity_ids(&self) -> Result<EntityIdSet, SkeinError>;

    /// True when the id is present as a vertex or edge source.
    fn has_entity(&self, id: &EntityId) -> Result<bool, SkeinError>;

    /// Number of distinct vertex ids (never the edge count).
    fn number_of_entities(&self) -> Result<usize, SkeinError>;

    /// Remove all vertices and edges.
    fn clear(&self) -> Result<(), SkeinError>;

    /// Flush durable state where applicable.
    fn finalise(&self) -> Result<(), SkeinError>;

    /// Release handles held by the store.
    fn close(self) -> Result<(), SkeinError>
    where
        Self: Sized;

    /// Release handles and remove any backing storage.
    fn destroy(self) -> Result<(), SkeinError>
    where
        Self: Sized;
}

// =============================================================================
// STORE EQUALITY
// =============================================================================

/// Check two unipartite stores for equality: identical vertex id sets, then
/// identical adjacency per vertex.
pub fn unipartite_stores_equal<A, B>(a: &A, b: &B) -> Result<bool, SkeinError>
where
    A: UnipartiteStore + ?Sized,
    B: UnipartiteStore + ?Sized,
{
    let a_ids = a.entity_ids()?;
    let b_ids = b.entity_ids()?;
    if a_ids != b_ids {
        return Ok(false);
    }

    for id in &a_ids {
        if a.adjacent(id)? != b.adjacent(id)? {
            return Ok(false);
        }
    }
    Ok(true)
}

// =============================================================================
// TAGGED BACKEND SELECTION
// =============================================================================

/// Tagged selection over the unipartite store implementations.
#[derive(Debug)]
pub enum UnipartiteBackend {
    /// In-memory store (fast, volatile).
    InMemory(InMemoryUnipartiteStore),
    /// Disk-backed store using redb.
    Persistent(RedbUnipartiteStore),
}

impl UnipartiteBackend {
    /// Create an in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryUnipartiteStore::new())
    }

    /// Open or create a persistent backend at the given path.
    pub fn persistent(path: impl AsRef<Path>) -> Result<Self, SkeinError> {
        Ok(Self::Persistent(RedbUnipartiteStore::open(path)?))
    }
}

impl UnipartiteStore for UnipartiteBackend {
    fn add_entity(&self, id: &EntityId) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.add_entity(id),
            Self::Persistent(store) => store.add_entity(id),
        }
    }

    fn add_directed(&self, src: &EntityId, dst: &EntityId) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.add_directed(src, dst),
            Self::Persistent(store) => store.add_directed(src, dst),
        }
    }

    fn add_undirected(&self, first: &EntityId, second: &EntityId) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.add_undirected(first, second),
            Self::Persistent(store) => store.add_undirected(first, second),
        }
    }

    fn edge_exists(&self, src: &EntityId, dst: &EntityId) -> Result<bool, SkeinError> {
        match self {
            Self::InMemory(store) => store.edge_exists(src, dst),
            Self::Persistent(store) => store.edge_exists(src, dst),
        }
    }

    fn adjacent(&self, id: &EntityId) -> Result<EntityIdSet, SkeinError> {
        match self {
            Self::InMemory(store) => store.adjacent(id),
            Self::Persistent(store) => store.adjacent(id),
        }
    }

    fn entity_ids(&self) -> Result<EntityIdSet, SkeinError> {
        match self {
            Self::InMemory(store) => store.entity_ids(),
            Self::Persistent(store) => store.entity_ids(),
        }
    }

    fn has_entity(&self, id: &EntityId) -> Result<bool, SkeinError> {
        match self {
            Self::InMemory(store) => store.has_entity(id),
            Self::Persistent(store) => store.has_entity(id),
        }
    }

    fn number_of_entities(&self) -> Result<usize, SkeinError> {
        match self {
            Self::InMemory(store) => store.number_of_entities(),
            Self::Persistent(store) => store.number_of_entities(),
        }
    }

    fn clear(&self) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.clear(),
            Self::Persistent(store) => store.clear(),
        }
    }

    fn finalise(&self) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.finalise(),
            Self::Persistent(store) => store.finalise(),
        }
    }

    fn close(self) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.close(),
            Self::Persistent(store) => store.close(),
        }
    }

    fn destroy(self) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.destroy(),
            Self::Persistent(store) => store.destroy(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn equal_stores_compare_equal() {
        let a = InMemoryUnipartiteStore::new();
        let b = InMemoryUnipartiteStore::new();
        for store in [&a, &b] {
            store.add_undirected(&id("1"), &id("2")).expect("edge");
            store.add_entity(&id("3")).expect("vertex");
        }

        assert!(unipartite_stores_equal(&a, &b).expect("equal"));
    }

    #[test]
    fn differing_adjacency_compares_unequal() {
        let a = InMemoryUnipartiteStore::new();
        let b = InMemoryUnipartiteStore::new();
        a.add_undirected(&id("1"), &id("2")).expect("edge");
        b.add_undirected(&id("1"), &id("2")).expect("edge");
        b.add_undirected(&id("1"), &id("3")).expect("edge");

        assert!(!unipartite_stores_equal(&a, &b).expect("equal"));
    }

    #[test]
    fn backend_enum_delegates() {
        let backend = UnipartiteBackend::in_memory();
        backend.add_undirected(&id("1"), &id("2")).expect("edge");

        assert!(backend.edge_exists(&id("2"), &id("1")).expect("exists"));
        assert_eq!(backend.number_of_entities().expect("count"), 2);
        backend.destroy().expect("destroy");
    }
}
