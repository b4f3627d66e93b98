//! In-memory bipartite store.
//!
//! Entities and documents live in `BTreeMap`s behind a single reader/writer
//! lock. Reads take the read side, writes the write side; `add_link` holds
//! the write lock across both sides of the link so the two linked-id sets
//! never disagree.

use crate::bipartite::BipartiteStore;
use crate::types::{Document, DocumentId, Entity, EntityId, SkeinError};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Interior maps guarded by the store lock.
#[derive(Debug, Default)]
struct BipartiteData {
    entities: BTreeMap<EntityId, Entity>,
    documents: BTreeMap<DocumentId, Document>,
}

/// In-memory implementation of [`BipartiteStore`].
#[derive(Debug, Default)]
pub struct InMemoryBipartiteStore {
    inner: RwLock<BipartiteData>,
}

impl InMemoryBipartiteStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BipartiteStore for InMemoryBipartiteStore {
    fn add_entity(&self, entity: Entity) -> Result<(), SkeinError> {
        let mut data = self.inner.write();
        data.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    fn add_document(&self, document: Document) -> Result<(), SkeinError> {
        let mut data = self.inner.write();
        data.documents.insert(document.id.clone(), document);
        Ok(())
    }

    fn add_link(
        &self,
        entity_id: &EntityId,
        document_id: &DocumentId,
    ) -> Result<(), SkeinError> {
        let mut data = self.inner.write();

        if !data.entities.contains_key(entity_id) {
            return Err(SkeinError::EntityNotFound(entity_id.clone()));
        }
        if !data.documents.contains_key(document_id) {
            return Err(SkeinError::DocumentNotFound(document_id.clone()));
        }

        if let Some(entity) = data.entities.get_mut(entity_id) {
            entity.add_document(document_id.clone());
        }
        if let Some(document) = data.documents.get_mut(document_id) {
            document.add_entity(entity_id.clone());
        }
        Ok(())
    }

    fn entity(&self, id: &EntityId) -> Result<Entity, SkeinError> {
        self.inner
            .read()
            .entities
            .get(id)
            .cloned()
            .ok_or_else(|| SkeinError::EntityNotFound(id.clone()))
    }

    fn document(&self, id: &DocumentId) -> Result<Document, SkeinError> {
        self.inner
            .read()
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| SkeinError::DocumentNotFound(id.clone()))
    }

    fn has_entity(&self, entity: &Entity) -> Result<bool, SkeinError> {
        Ok(self
            .inner
            .read()
            .entities
            .get(&entity.id)
            .is_some_and(|stored| stored == entity))
    }

    fn has_document(&self, document: &Document) -> Result<bool, SkeinError> {
        Ok(self
            .inner
            .read()
            .documents
            .get(&document.id)
            .is_some_and(|stored| stored == document))
    }

    fn has_entity_with_id(&self, id: &EntityId) -> Result<bool, SkeinError> {
        Ok(self.inner.read().entities.contains_key(id))
    }

    fn has_document_with_id(&self, id: &DocumentId) -> Result<bool, SkeinError> {
        Ok(self.inner.read().documents.contains_key(id))
    }

    fn entity_ids(&self) -> Result<Vec<EntityId>, SkeinError> {
        // Ids are copied out so the snapshot stays stable while later
        // writes land on the store.
        Ok(self.inner.read().entities.keys().cloned().collect())
    }

    fn document_ids(&self) -> Result<Vec<DocumentId>, SkeinError> {
        Ok(self.inner.read().documents.keys().cloned().collect())
    }

    fn number_of_entities(&self) -> Result<usize, SkeinError> {
        Ok(self.inner.read().entities.len())
    }

    fn number_of_documents(&self) -> Result<usize, SkeinError> {
        Ok(self.inner.read().documents.len())
    }

    fn number_of_entities_with_documents(&self) -> Result<usize, SkeinError> {
        Ok(self
            .inner
            .read()
            .entities
            .values()
            .filter(|entity| !entity.linked_documents.is_empty())
            .count())
    }

    fn number_of_documents_with_entities(&self) -> Result<usize, SkeinError> {
        Ok(self
            .inner
            .read()
            .documents
            .values()
            .filter(|document| !document.linked_entities.is_empty())
            .count())
    }

    fn clear(&self) -> Result<(), SkeinError> {
        let mut data = self.inner.write();
        data.entities.clear();
        data.documents.clear();
        Ok(())
    }

    fn finalise(&self) -> Result<(), SkeinError> {
        // Nothing to flush for the in-memory store.
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

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::{Attributes, attributes};

    fn entity(id: &str) -> Entity {
        Entity::new(id, "person", Attributes::new()).expect("entity")
    }

    fn document(id: &str) -> Document {
        Document::new(id, "report", Attributes::new()).expect("document")
    }

    #[test]
    fn add_and_get_entity() {
        let store = InMemoryBipartiteStore::new();
        store
            .add_entity(Entity::new("e-1", "person", attributes(&[("name", "Ada")])).expect("e"))
            .expect("add");

        let found = store.entity(&EntityId::new("e-1")).expect("get");
        assert_eq!(found.entity_type, "person");
        assert_eq!(found.attributes.get("name").map(String::as_str), Some("Ada"));
    }

    #[test]
    fn get_missing_entity_fails() {
        let store = InMemoryBipartiteStore::new();
        assert!(matches!(
            store.entity(&EntityId::new("e-404")),
            Err(SkeinError::EntityNotFound(_))
        ));
    }

    #[test]
    fn add_entity_is_last_write_wins() {
        let store = InMemoryBipartiteStore::new();
        store.add_entity(entity("e-1")).expect("add");
        store
            .add_entity(Entity::new("e-1", "address", Attributes::new()).expect("e"))
            .expect("add");

        assert_eq!(store.number_of_entities().expect("count"), 1);
        let found = store.entity(&EntityId::new("e-1")).expect("get");
        assert_eq!(found.entity_type, "address");
    }

    #[test]
    fn add_link_updates_both_sides() {
        let store = InMemoryBipartiteStore::new();
        store.add_entity(entity("e-1")).expect("add");
        store.add_document(document("d-1")).expect("add");
        store
            .add_link(&EntityId::new("e-1"), &DocumentId::new("d-1"))
            .expect("link");

        let e = store.entity(&EntityId::new("e-1")).expect("get");
        assert!(e.linked_documents.contains(&DocumentId::new("d-1")));

        let d = store.document(&DocumentId::new("d-1")).expect("get");
        assert!(d.linked_entities.contains(&EntityId::new("e-1")));
    }

    #[test]
    fn add_link_requires_both_endpoints() {
        let store = InMemoryBipartiteStore::new();
        store.add_entity(entity("e-1")).expect("add");

        assert!(matches!(
            store.add_link(&EntityId::new("e-1"), &DocumentId::new("d-404")),
            Err(SkeinError::DocumentNotFound(_))
        ));
        assert!(matches!(
            store.add_link(&EntityId::new("e-404"), &DocumentId::new("d-404")),
            Err(SkeinError::EntityNotFound(_))
        ));
    }

    #[test]
    fn link_counts() {
        let store = InMemoryBipartiteStore::new();
        store.add_entity(entity("e-1")).expect("add");
        store.add_entity(entity("e-2")).expect("add");
        store.add_document(document("d-1")).expect("add");
        store.add_document(document("d-2")).expect("add");
        store
            .add_link(&EntityId::new("e-1"), &DocumentId::new("d-1"))
            .expect("link");

        assert_eq!(store.number_of_entities_with_documents().expect("count"), 1);
        assert_eq!(store.number_of_documents_with_entities().expect("count"), 1);
    }

    #[test]
    fn id_snapshot_is_stable_across_writes() {
        let store = InMemoryBipartiteStore::new();
        store.add_entity(entity("e-1")).expect("add");

        let snapshot = store.entity_ids().expect("ids");
        store.add_entity(entity("e-2")).expect("add");

        assert_eq!(snapshot, vec![EntityId::new("e-1")]);
        assert_eq!(store.number_of_entities().expect("count"), 2);
    }

    #[test]
    fn clear_removes_everything() {
        let store = InMemoryBipartiteStore::new();
        store.add_entity(entity("e-1")).expect("add");
        store.add_document(document("d-1")).expect("add");

        store.clear().expect("clear");
        assert_eq!(store.number_of_entities().expect("count"), 0);
        assert_eq!(store.number_of_documents().expect("count"), 0);
    }
}
