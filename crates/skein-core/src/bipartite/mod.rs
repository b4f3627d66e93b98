//! # Bipartite Store
//!
//! The bipartite store holds the document/entity corpus: entities, documents
//! and the links between them. Edges only ever connect an entity to a
//! document.
//!
//! Two implementations share the [`BipartiteStore`] contract:
//! - [`InMemoryBipartiteStore`] — `RwLock`-guarded BTree maps
//! - [`RedbBipartiteStore`] — a single ordered redb table with a prefixed
//!   key layout
//!
//! [`BipartiteBackend`] is the tagged selection over the two, for callers
//! that pick a backend from configuration.

mod memory;
mod redb_store;

pub use memory::InMemoryBipartiteStore;
pub use redb_store::RedbBipartiteStore;

use crate::types::{Document, DocumentId, Entity, EntityId, SkeinError};
use std::path::Path;

// =============================================================================
// STORE CONTRACT
// =============================================================================

/// Behavioral contract shared by all bipartite store implementations.
///
/// Methods take `&self`; implementations provide interior mutability (an
/// `RwLock` for the in-memory store, MVCC transactions for redb) so a store
/// can be shared across the projector's worker threads.
///
/// Adding an entity or document with an identifier that is already present
/// replaces the previous content (last write wins), including its linked-id
/// set. Identifier enumeration returns a snapshot taken at call time; the
/// snapshot does not observe later writes.
pub trait BipartiteStore {
    /// Insert or replace an entity.
    fn add_entity(&self, entity: Entity) -> Result<(), SkeinError>;

    /// Insert or replace a document.
    fn add_document(&self, document: Document) -> Result<(), SkeinError>;

    /// Link an entity and a document so that each side sees the other in its
    /// linked-id set.
    ///
    /// Fails with `EntityNotFound` / `DocumentNotFound` when an endpoint is
    /// not stored.
    fn add_link(&self, entity_id: &EntityId, document_id: &DocumentId)
    -> Result<(), SkeinError>;

    /// Retrieve an entity by identifier. Fails with `EntityNotFound` when the
    /// identifier is unknown, never a silent absence.
    fn entity(&self, id: &EntityId) -> Result<Entity, SkeinError>;

    /// Retrieve a document by identifier. Fails with `DocumentNotFound` when
    /// the identifier is unknown.
    fn document(&self, id: &DocumentId) -> Result<Document, SkeinError>;

    /// True when an entity with the same identifier and identical content is
    /// stored.
    fn has_entity(&self, entity: &Entity) -> Result<bool, SkeinError>;

    /// True when a document with the same identifier and identical content is
    /// stored.
    fn has_document(&self, document: &Document) -> Result<bool, SkeinError>;

    /// True when any entity with the given identifier is stored.
    fn has_entity_with_id(&self, id: &EntityId) -> Result<bool, SkeinError>;

    /// True when any document with the given identifier is stored.
    fn has_document_with_id(&self, id: &DocumentId) -> Result<bool, SkeinError>;

    /// Snapshot of all stored entity identifiers.
    fn entity_ids(&self) -> Result<Vec<EntityId>, SkeinError>;

    /// Snapshot of all stored document identifiers.
    fn document_ids(&self) -> Result<Vec<DocumentId>, SkeinError>;

    /// Number of stored entities.
    fn number_of_entities(&self) -> Result<usize, SkeinError>;

    /// Number of stored documents.
    fn number_of_documents(&self) -> Result<usize, SkeinError>;

    /// Number of entities linked to at least one document.
    fn number_of_entities_with_documents(&self) -> Result<usize, SkeinError>;

    /// Number of documents linked to at least one entity.
    fn number_of_documents_with_entities(&self) -> Result<usize, SkeinError>;

    /// Remove all stored entities, documents and links.
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

/// Check two bipartite stores for equality by two-sided enumeration.
///
/// Every identifier in `a` must be present in `b` with identical content, and
/// vice versa. The implementations being compared may differ.
pub fn bipartite_stores_equal<A, B>(a: &A, b: &B) -> Result<bool, SkeinError>
where
    A: BipartiteStore + ?Sized,
    B: BipartiteStore + ?Sized,
{
    if a.number_of_entities()? != b.number_of_entities()?
        || a.number_of_documents()? != b.number_of_documents()?
    {
        return Ok(false);
    }

    for id in a.entity_ids()? {
        let entity = a.entity(&id)?;
        if !b.has_entity(&entity)? {
            return Ok(false);
        }
    }
    for id in a.document_ids()? {
        let document = a.document(&id)?;
        if !b.has_document(&document)? {
            return Ok(false);
        }
    }

    for id in b.entity_ids()? {
        if !a.has_entity_with_id(&id)? {
            return Ok(false);
        }
    }
    for id in b.document_ids()? {
        if !a.has_document_with_id(&id)? {
            return Ok(false);
        }
    }

    Ok(true)
}

// =============================================================================
// TAGGED BACKEND SELECTION
// =============================================================================

/// Tagged selection over the bipartite store implementations.
///
/// Callers that choose a backend from configuration hold this enum instead of
/// a generic parameter.
#[derive(Debug)]
pub enum BipartiteBackend {
    /// In-memory store (fast, volatile).
    InMemory(InMemoryBipartiteStore),
    /// Disk-backed store using redb.
    Persistent(RedbBipartiteStore),
}

impl BipartiteBackend {
    /// Create an in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryBipartiteStore::new())
    }

    /// Open or create a persistent backend at the given path.
    pub fn persistent(path: impl AsRef<Path>) -> Result<Self, SkeinError> {
        Ok(Self::Persistent(RedbBipartiteStore::open(path)?))
    }
}

impl BipartiteStore for BipartiteBackend {
    fn add_entity(&self, entity: Entity) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.add_entity(entity),
            Self::Persistent(store) => store.add_entity(entity),
        }
    }

    fn add_document(&self, document: Document) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.add_document(document),
            Self::Persistent(store) => store.add_document(document),
        }
    }

    fn add_link(
        &self,
        entity_id: &EntityId,
        document_id: &DocumentId,
    ) -> Result<(), SkeinError> {
        match self {
            Self::InMemory(store) => store.add_link(entity_id, document_id),
            Self::Persistent(store) => store.add_link(entity_id, document_id),
        }
    }

    fn entity(&self, id: &EntityId) -> Result<Entity, SkeinError> {
        match self {
            Self::InMemory(store) => store.entity(id),
            Self::Persistent(store) => store.entity(id),
        }
    }

    fn document(&self, id: &DocumentId) -> Result<Document, SkeinError> {
        match self {
            Self::InMemory(store) => store.document(id),
            Self::Persistent(store) => store.document(id),
        }
    }

    fn has_entity(&self, entity: &Entity) -> Result<bool, SkeinError> {
        match self {
            Self::InMemory(store) => store.has_entity(entity),
            Self::Persistent(store) => store.has_entity(entity),
        }
    }

    fn has_document(&self, document: &Document) -> Result<bool, SkeinError> {
        match self {
            Self::InMemory(store) => store.has_document(document),
            Self::Persistent(store) => store.has_document(document),
        }
    }

    fn has_entity_with_id(&self, id: &EntityId) -> Result<bool, SkeinError> {
        match self {
            Self::InMemory(store) => store.has_entity_with_id(id),
            Self::Persistent(store) => store.has_entity_with_id(id),
        }
    }

    fn has_document_with_id(&self, id: &DocumentId) -> Result<bool, SkeinError> {
        match self {
            Self::InMemory(store) => store.has_document_with_id(id),
            Self::Persistent(store) => store.has_document_with_id(id),
        }
    }

    fn entity_ids(&self) -> Result<Vec<EntityId>, SkeinError> {
        match self {
            Self::InMemory(store) => store.entity_ids(),
            Self::Persistent(store) => store.entity_ids(),
        }
    }

    fn document_ids(&self) -> Result<Vec<DocumentId>, SkeinError> {
        match self {
            Self::InMemory(store) => store.document_ids(),
            Self::Persistent(store) => store.document_ids(),
        }
    }

    fn number_of_entities(&self) -> Result<usize, SkeinError> {
        match self {
            Self::InMemory(store) => store.number_of_entities(),
            Self::Persistent(store) => store.number_of_entities(),
        }
    }

    fn number_of_documents(&self) -> Result<usize, SkeinError> {
        match self {
            Self::InMemory(store) => store.number_of_documents(),
            Self::Persistent(store) => store.number_of_documents(),
        }
    }

    fn number_of_entities_with_documents(&self) -> Result<usize, SkeinError> {
        match self {
            Self::InMemory(store) => store.number_of_entities_with_documents(),
            Self::Persistent(store) => store.number_of_entities_with_documents(),
        }
    }

    fn number_of_documents_with_entities(&self) -> Result<usize, SkeinError> {
        match self {
            Self::InMemory(store) => store.number_of_documents_with_entities(),
            Self::Persistent(store) => store.number_of_documents_with_entities(),
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
