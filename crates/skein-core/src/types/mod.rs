//! # Core Type Definitions
//!
//! This module contains the core types for the skein storage and traversal
//! engine:
//! - Entity and document identifiers (`EntityId`, `DocumentId`)
//! - The bipartite records (`Entity`, `Document`)
//! - Identifier validation against the persistent key grammar
//! - Error types (`SkeinError`)
//!
//! ## Determinism Guarantees
//!
//! All collection-valued fields use `BTreeMap`/`BTreeSet` so iteration order
//! is deterministic and store equality checks are reproducible.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

// =============================================================================
// KEY GRAMMAR
// =============================================================================

/// Reserved separator byte used to delimit fragments of persistent keys.
pub const KEY_SEPARATOR: char = '#';

/// Byte immediately above [`KEY_SEPARATOR`]; used as the exclusive upper
/// bound of a prefix range scan. Identifiers may contain neither byte.
pub const KEY_RANGE_UPPER: char = '$';

/// Validate an identifier against the persistent key grammar.
///
/// An identifier is valid if it is non-empty and contains neither the
/// separator `#` nor the range-bound byte `$`.
pub fn validate_id(id: &str) -> Result<(), SkeinError> {
    if id.is_empty() {
        return Err(SkeinError::EmptyId);
    }
    if id.contains(KEY_SEPARATOR) || id.contains(KEY_RANGE_UPPER) {
        return Err(SkeinError::IllegalIdCharacter(id.to_string()));
    }
    Ok(())
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of an entity in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    /// Create a new entity identifier from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier of a document in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// Create a new document identifier from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Set of entity identifiers with deterministic iteration order.
pub type EntityIdSet = BTreeSet<EntityId>;

/// Set of document identifiers with deterministic iteration order.
pub type DocumentIdSet = BTreeSet<DocumentId>;

/// Typed attribute map carried by entities and documents.
pub type Attributes = BTreeMap<String, String>;

/// Build an attribute map from string pairs.
#[must_use]
pub fn attributes(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// =============================================================================
// ENTITY
// =============================================================================

/// An entity of interest mentioned by documents in the corpus.
///
/// Entities are created by loaders and upsert-replaced in the bipartite
/// store; the linked-document set is maintained by `add_link`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// The entity identifier.
    pub id: EntityId,
    /// The entity type, e.g. `person` or `address`.
    pub entity_type: String,
    /// Name to value attribute map.
    pub attributes: Attributes,
    /// Identifiers of the documents this entity appears in.
    pub linked_documents: DocumentIdSet,
}

impl Entity {
    /// Create a new entity with no linked documents.
    ///
    /// Fails with `EmptyId` / `IllegalIdCharacter` when the identifier
    /// violates the key grammar and `EmptyType` when the type is blank.
    pub fn new(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        attributes: Attributes,
    ) -> Result<Self, SkeinError> {
        let id = id.into();
        validate_id(&id)?;

        let entity_type = entity_type.into();
        if entity_type.is_empty() {
            return Err(SkeinError::EmptyType(id));
        }

        Ok(Self {
            id: EntityId(id),
            entity_type,
            attributes,
            linked_documents: DocumentIdSet::new(),
        })
    }

    /// Record that this entity appears in the given document.
    pub fn add_document(&mut self, document_id: DocumentId) {
        self.linked_documents.insert(document_id);
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// A document in the corpus mentioning zero or more entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// The document identifier.
    pub id: DocumentId,
    /// The document type, e.g. `report`.
    pub document_type: String,
    /// Name to value attribute map.
    pub attributes: Attributes,
    /// Identifiers of the entities this document mentions.
    pub linked_entities: EntityIdSet,
}

impl Document {
    /// Create a new document with no linked entities.
    ///
    /// Fails with `EmptyId` / `IllegalIdCharacter` when the identifier
    /// violates the key grammar and `EmptyType` when the type is blank.
    pub fn new(
        id: impl Into<String>,
        document_type: impl Into<String>,
        attributes: Attributes,
    ) -> Result<Self, SkeinError> {
        let id = id.into();
        validate_id(&id)?;

        let document_type = document_type.into();
        if document_type.is_empty() {
            return Err(SkeinError::EmptyType(id));
        }

        Ok(Self {
            id: DocumentId(id),
            document_type,
            attributes,
            linked_entities: EntityIdSet::new(),
        })
    }

    /// Record that this document mentions the given entity.
    pub fn add_entity(&mut self, entity_id: EntityId) {
        self.linked_entities.insert(entity_id);
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the skein engine.
///
/// - No silent failures
/// - Use `Result<T, SkeinError>` for fallible operations
/// - Invalid inputs are rejected before any side effect is performed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkeinError {
    /// An identifier was empty.
    #[error("empty identifier")]
    EmptyId,

    /// An identifier contained a reserved key byte (`#` or `$`).
    #[error("identifier contains a reserved character: {0}")]
    IllegalIdCharacter(String),

    /// An entity or document type was empty.
    #[error("empty type for identifier: {0}")]
    EmptyType(String),

    /// The requested entity was not found in the store.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The requested document was not found in the store.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// The root vertex of a traversal was not found in the graph.
    #[error("root vertex not found: {0}")]
    RootVertexNotFound(EntityId),

    /// The goal vertex of a traversal was not found in the graph.
    #[error("goal vertex not found: {0}")]
    GoalVertexNotFound(EntityId),

    /// An edge would connect a vertex to itself.
    #[error("self loop on vertex: {0}")]
    SelfLoop(EntityId),

    /// The maximum number of hops must be at least 1.
    #[error("invalid number of hops: {0}")]
    InvalidHops(usize),

    /// Path finding requires at least one entity set.
    #[error("no entity sets provided")]
    NoEntitySets,

    /// An entity set contained no identifiers.
    #[error("entity set is empty: {0}")]
    EmptyEntitySet(String),

    /// An entity set had no name.
    #[error("entity set has no name")]
    NoNameForEntitySet,

    /// Spidering requires at least one seed entity.
    #[error("no seed entities provided")]
    NoSeedEntities,

    /// A persistent key did not match the expected grammar.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// A persistent key named a different entity than the scan expected.
    #[error("unexpected entity in key: {0}")]
    UnexpectedEntityInKey(String),

    /// The projector requires at least one worker.
    #[error("invalid number of workers: {0}")]
    InvalidNumberOfWorkers(usize),

    /// The projector's job channel must hold at least one job.
    #[error("invalid job channel size: {0}")]
    InvalidJobChannelSize(usize),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An error propagated from the key/value backend.
    #[error("storage error: {0}")]
    Storage(String),
}

// =============================================================================
// TESTS
// =============================================================================
