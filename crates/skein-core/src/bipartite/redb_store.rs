//! redb-backed bipartite store.
//!
//! A single ordered table holds the whole corpus under a prefixed key
//! layout (the separator is the byte `#`, `$` is the byte above it):
//!
//! - `e#<entityId>`                 -> postcard record (id, type, attributes)
//! - `d#<documentId>`               -> postcard record
//! - `edl#<entityId>#<documentId>`  -> empty (entity to document link)
//! - `del#<documentId>#<entityId>`  -> empty (document to entity link)
//!
//! Linked-id sets are reconstructed from the link keys with a prefix range
//! scan from `<prefix>#` (inclusive) to `<prefix>$` (exclusive). The layout
//! is byte-exact for cross-version compatibility of the backing file, which
//! is why identifiers may contain neither `#` nor `$`.

use crate::bipartite::BipartiteStore;
use crate::types::{
    Attributes, Document, DocumentId, Entity, EntityId, SkeinError, validate_id,
};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Table for the corpus: prefixed key -> record bytes (empty for links).
const BIPARTITE: TableDefinition<&str, &[u8]> = TableDefinition::new("bipartite");

/// Link keys carry no payload.
const EMPTY_VALUE: &[u8] = &[];

const ENTITY_PREFIX: &str = "e";
const DOCUMENT_PREFIX: &str = "d";
const ENTITY_DOCUMENT_LINK_PREFIX: &str = "edl";
const DOCUMENT_ENTITY_LINK_PREFIX: &str = "del";

/// Serialized form of an entity or document record. Linked ids are not part
/// of the record; they live in the link keys.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    record_type: String,
    attributes: Attributes,
}

fn record_key(prefix: &str, id: &str) -> String {
    format!("{prefix}#{id}")
}

fn link_key(prefix: &str, first: &str, second: &str) -> String {
    format!("{prefix}#{first}#{second}")
}

/// Inclusive lower and exclusive upper bound of a prefix range scan.
fn prefix_bounds(prefix: &str) -> (String, String) {
    (format!("{prefix}#"), format!("{prefix}$"))
}

/// Split `prefix#first#second` into its fragments.
fn split_link_key(key: &str, prefix: &str) -> Result<(String, String), SkeinError> {
    let parts: Vec<&str> = key.split('#').collect();
    match parts.as_slice() {
        [found_prefix, first, second] if *found_prefix == prefix => {
            Ok(((*first).to_string(), (*second).to_string()))
        }
        _ => Err(SkeinError::MalformedKey(key.to_string())),
    }
}

/// A disk-backed bipartite store using redb.
pub struct RedbBipartiteStore {
    /// The redb database handle.
    db: Database,
    /// Location of the backing file; needed by `destroy`.
    path: PathBuf,
}

impl std::fmt::Debug for RedbBipartiteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBipartiteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBipartiteStore {
    /// Open or create a bipartite store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SkeinError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| SkeinError::Storage(e.to_string()))?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| SkeinError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(BIPARTITE)
                .map_err(|e| SkeinError::Storage(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| SkeinError::Storage(e.to_string()))?;
        }

        tracing::debug!(path = %path.as_ref().display(), "opened bipartite store");

        Ok(Self {
            db,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Collect the keys of a prefix range within one read transaction.
    fn keys_in_range(&self, lower: &str, upper: &str) -> Result<Vec<String>, SkeinError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(BIPARTITE)
            .map_err(|e| SkeinError::Storage(e.to_string()))?;

        let mut keys = Vec::new();
        for entry in table
            .range::<&str>(lower..upper)
            .map_err(|e| SkeinError::Storage(e.to_string()))?
        {
            let (key, _) = entry.map_err(|e| SkeinError::Storage(e.to_string()))?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    /// Ids found in the record range of `prefix`.
    fn record_ids(&self, prefix: &str) -> Result<Vec<String>, SkeinError> {
        let (lower, upper) = prefix_bounds(prefix);
        let marker = format!("{prefix}#");

        let mut ids = Vec::new();
        for key in self.keys_in_range(&lower, &upper)? {
            match key.strip_prefix(&marker) {
                Some(id) => ids.push(id.to_string()),
                None => return Err(SkeinError::MalformedKey(key)),
            }
        }
        Ok(ids)
    }

    /// Distinct first fragments of the link keys under `prefix`.
    fn distinct_link_sources(&self, prefix: &str) -> Result<usize, SkeinError> {
        let (lower, upper) = prefix_bounds(prefix);

        let mut sources = std::collections::BTreeSet::new();
        for key in self.keys_in_range(&lower, &upper)? {
            let (first, _) = split_link_key(&key, prefix)?;
            sources.insert(first);
        }
        Ok(sources.len())
    }

    fn read_record(&self, prefix: &str, id: &str) -> Result<Option<StoredRecord>, SkeinError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(BIPARTITE)
            .map_err(|e| SkeinError::Storage(e.to_string()))?;

        match table
            .get(record_key(prefix, id).as_str())
            .map_err(|e| SkeinError::Storage(e.to_string()))?
        {
            Some(value) => {
                let record: StoredRecord = postcard::from_bytes(value.value())
                    .map_err(|e| SkeinError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Ids found in the second fragment of `prefix#<owner>#*` link keys.
    fn linked_ids(&self, prefix: &str, owner: &str) -> Result<Vec<String>, SkeinError> {
        let lower = format!("{prefix}#{owner}#");
        let upper = format!("{prefix}#{owner}$");

        let mut ids = Vec::new();
        for key in self.keys_in_range(&lower, &upper)? {
            let (found_owner, linked) = split_link_key(&key, prefix)?;
            if found_owner != owner {
                return Err(SkeinError::UnexpectedEntityInKey(key));
            }
            ids.push(linked);
        }
        Ok(ids)
    }

    /// Replace a record and its owned link keys in one transaction.
    fn upsert_record(
        &self,
        record_prefix: &str,
        link_prefix: &str,
        record: &StoredRecord,
        linked_ids: impl Iterator<Item = String>,
    ) -> Result<(), SkeinError> {
        let stale_links = self.linked_ids(link_prefix, &record.id)?;

        let bytes = postcard::to_allocvec(record)
            .map_err(|e| SkeinError::Serialization(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(BIPARTITE)
                .map_err(|e| SkeinError::Storage(e.to_string()))?;

            for stale in stale_links {
                table
                    .remove(link_key(link_prefix, &record.id, &stale).as_str())
                    .map_err(|e| SkeinError::Storage(e.to_string()))?;
            }

            table
                .insert(record_key(record_prefix, &record.id).as_str(), bytes.as_slice())
                .map_err(|e| SkeinError::Storage(e.to_string()))?;

            for linked in linked_ids {
                table
                    .insert(link_key(link_prefix, &record.id, &linked).as_str(), EMPTY_VALUE)
                    .map_err(|e| SkeinError::Storage(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl BipartiteStore for RedbBipartiteStore {
    fn add_entity(&self, entity: Entity) -> Result<(), SkeinError> {
        validate_id(entity.id.as_str())?;

        let record = StoredRecord {
            id: entity.id.as_str().to_string(),
            record_type: entity.entity_type,
            attributes: entity.attributes,
        };
        self.upsert_record(
            ENTITY_PREFIX,
            ENTITY_DOCUMENT_LINK_PREFIX,
            &record,
            entity
                .linked_documents
                .into_iter()
                .map(|id| id.as_str().to_string()),
        )
    }

    fn add_document(&self, document: Document) -> Result<(), SkeinError> {
        validate_id(document.id.as_str())?;

        let record = StoredRecord {
            id: document.id.as_str().to_string(),
            record_type: document.document_type,
            attributes: document.attributes,
        };
        self.upsert_record(
            DOCUMENT_PREFIX,
            DOCUMENT_ENTITY_LINK_PREFIX,
            &record,
            document
                .linked_entities
                .into_iter()
                .map(|id| id.as_str().to_string()),
        )
    }

    fn add_link(
        &self,
        entity_id: &EntityId,
        document_id: &DocumentId,
    ) -> Result<(), SkeinError> {
        validate_id(entity_id.as_str())?;
        validate_id(document_id.as_str())?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(BIPARTITE)
                .map_err(|e| SkeinError::Storage(e.to_string()))?;

            if table
                .get(record_key(ENTITY_PREFIX, entity_id.as_str()).as_str())
                .map_err(|e| SkeinError::Storage(e.to_string()))?
                .is_none()
            {
                return Err(SkeinError::EntityNotFound(entity_id.clone()));
            }
            if table
                .get(record_key(DOCUMENT_PREFIX, document_id.as_str()).as_str())
                .map_err(|e| SkeinError::Storage(e.to_string()))?
                .is_none()
            {
                return Err(SkeinError::DocumentNotFound(document_id.clone()));
            }

            table
                .insert(
                    link_key(
                        ENTITY_DOCUMENT_LINK_PREFIX,
                        entity_id.as_str(),
                        document_id.as_str(),
                    )
                    .as_str(),
                    EMPTY_VALUE,
                )
                .map_err(|e| SkeinError::Storage(e.to_string()))?;
            table
                .insert(
                    link_key(
                        DOCUMENT_ENTITY_LINK_PREFIX,
                        document_id.as_str(),
                        entity_id.as_str(),
                    )
                    .as_str(),
                    EMPTY_VALUE,
                )
                .map_err(|e| SkeinError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        Ok(())
    }

    fn entity(&self, id: &EntityId) -> Result<Entity, SkeinError> {
        let record = self
            .read_record(ENTITY_PREFIX, id.as_str())?
            .ok_or_else(|| SkeinError::EntityNotFound(id.clone()))?;

        let mut entity = Entity {
            id: EntityId::new(record.id),
            entity_type: record.record_type,
            attributes: record.attributes,
            linked_documents: std::collections::BTreeSet::new(),
        };
        for linked in self.linked_ids(ENTITY_DOCUMENT_LINK_PREFIX, id.as_str())? {
            entity.linked_documents.insert(DocumentId::new(linked));
        }
        Ok(entity)
    }

    fn document(&self, id: &DocumentId) -> Result<Document, SkeinError> {
        let record = self
            .read_record(DOCUMENT_PREFIX, id.as_str())?
            .ok_or_else(|| SkeinError::DocumentNotFound(id.clone()))?;

        let mut document = Document {
            id: DocumentId::new(record.id),
            document_type: record.record_type,
            attributes: record.attributes,
            linked_entities: std::collections::BTreeSet::new(),
        };
        for linked in self.linked_ids(DOCUMENT_ENTITY_LINK_PREFIX, id.as_str())? {
            document.linked_entities.insert(EntityId::new(linked));
        }
        Ok(document)
    }

    fn has_entity(&self, entity: &Entity) -> Result<bool, SkeinError> {
        match self.entity(&entity.id) {
            Ok(stored) => Ok(stored == *entity),
            Err(SkeinError::EntityNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn has_document(&self, document: &Document) -> Result<bool, SkeinError> {
        match self.document(&document.id) {
            Ok(stored) => Ok(stored == *document),
            Err(SkeinError::DocumentNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn has_entity_with_id(&self, id: &EntityId) -> Result<bool, SkeinError> {
        Ok(self.read_record(ENTITY_PREFIX, id.as_str())?.is_some())
    }

    fn has_document_with_id(&self, id: &DocumentId) -> Result<bool, SkeinError> {
        Ok(self.read_record(DOCUMENT_PREFIX, id.as_str())?.is_some())
    }

    fn entity_ids(&self) -> Result<Vec<EntityId>, SkeinError> {
        Ok(self
            .record_ids(ENTITY_PREFIX)?
            .into_iter()
            .map(EntityId::new)
            .collect())
    }

    fn document_ids(&self) -> Result<Vec<DocumentId>, SkeinError> {
        Ok(self
            .record_ids(DOCUMENT_PREFIX)?
            .into_iter()
            .map(DocumentId::new)
            .collect())
    }

    fn number_of_entities(&self) -> Result<usize, SkeinError> {
        Ok(self.record_ids(ENTITY_PREFIX)?.len())
    }

    fn number_of_documents(&self) -> Result<usize, SkeinError> {
        Ok(self.record_ids(DOCUMENT_PREFIX)?.len())
    }

    fn number_of_entities_with_documents(&self) -> Result<usize, SkeinError> {
        self.distinct_link_sources(ENTITY_DOCUMENT_LINK_PREFIX)
    }

    fn number_of_documents_with_entities(&self) -> Result<usize, SkeinError> {
        self.distinct_link_sources(DOCUMENT_ENTITY_LINK_PREFIX)
    }

    fn clear(&self) -> Result<(), SkeinError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        write_txn
            .delete_table(BIPARTITE)
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        let _ = write_txn
            .open_table(BIPARTITE)
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        write_txn
            .commit()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "cleared bipartite store");
        Ok(())
    }

    fn finalise(&self) -> Result<(), SkeinError> {
        // Every write transaction commits durably; nothing is buffered.
        Ok(())
    }

    fn close(self) -> Result<(), SkeinError> {
        drop(self.db);
        Ok(())
    }

    fn destroy(self) -> Result<(), SkeinError> {
        let Self { db, path } = self;
        drop(db);
        std::fs::remove_file(&path).map_err(|e| SkeinError::Storage(e.to_string()))?;

        tracing::debug!(path = %path.display(), "destroyed bipartite store");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
