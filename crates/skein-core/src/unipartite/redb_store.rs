//! redb-backed unipartite graph store.
//!
//! A single ordered table of marker keys, all with empty values:
//!
//! - `n#<id>`          standalone vertex
//! - `e#<src>#<dst>`   directed half-edge
//!
//! Adjacency of `src` is the prefix range `e#<src>#` (inclusive) to
//! `e#<src>$` (exclusive). The undirected edge representation is two
//! independent half-edge keys; `add_undirected` writes both inside one
//! transaction, and re-inserts are idempotent, so interleaved writers
//! converge on the same key set.

use crate::types::{EntityId, EntityIdSet, SkeinError, validate_id};
use crate::unipartite::UnipartiteStore;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::{Path, PathBuf};

/// Table for the projection: marker key -> empty value.
const UNIPARTITE: TableDefinition<&str, ()> = TableDefinition::new("unipartite");

const VERTEX_PREFIX: &str = "n";
const EDGE_PREFIX: &str = "e";

fn vertex_key(id: &EntityId) -> String {
    format!("{VERTEX_PREFIX}#{id}")
}

fn edge_key(src: &EntityId, dst: &EntityId) -> String {
    format!("{EDGE_PREFIX}#{src}#{dst}")
}

/// A disk-backed unipartite graph store using redb.
pub struct RedbUnipartiteStore {
    /// The redb database handle.
    db: Database,
    /// Location of the backing file; needed by `destroy`.
    path: PathBuf,
}

impl std::fmt::Debug for RedbUnipartiteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbUnipartiteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbUnipartiteStore {
    /// Open or create a unipartite store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SkeinError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| SkeinError::Storage(e.to_string()))?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| SkeinError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(UNIPARTITE)
                .map_err(|e| SkeinError::Storage(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| SkeinError::Storage(e.to_string()))?;
        }

        tracing::debug!(path = %path.as_ref().display(), "opened unipartite store");

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
            .open_table(UNIPARTITE)
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

    fn key_exists(&self, key: &str) -> Result<bool, SkeinError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(UNIPARTITE)
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        Ok(table
            .get(key)
            .map_err(|e| SkeinError::Storage(e.to_string()))?
            .is_some())
    }

    fn insert_keys(&self, keys: &[String]) -> Result<(), SkeinError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(UNIPARTITE)
                .map_err(|e| SkeinError::Storage(e.to_string()))?;
            for key in keys {
                table
                    .insert(key.as_str(), ())
                    .map_err(|e| SkeinError::Storage(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Split `e#<src>#<dst>`, checking the source fragment.
    fn split_edge_key(key: &str, expected_src: &str) -> Result<String, SkeinError> {
        let parts: Vec<&str> = key.split('#').collect();
        match parts.as_slice() {
            [EDGE_PREFIX, src, dst] => {
                if *src != expected_src {
                    return Err(SkeinError::UnexpectedEntityInKey(key.to_string()));
                }
                Ok((*dst).to_string())
            }
            _ => Err(SkeinError::MalformedKey(key.to_string())),
        }
    }
}

impl UnipartiteStore for RedbUnipartiteStore {
    fn add_entity(&self, id: &EntityId) -> Result<(), SkeinError> {
        validate_id(id.as_str())?;
        self.insert_keys(&[vertex_key(id)])
    }

    fn add_directed(&self, src: &EntityId, dst: &EntityId) -> Result<(), SkeinError> {
        validate_id(src.as_str())?;
        validate_id(dst.as_str())?;
        if src == dst {
            return Err(SkeinError::SelfLoop(src.clone()));
        }

        self.insert_keys(&[edge_key(src, dst)])
    }

    fn add_undirected(&self, first: &EntityId, second: &EntityId) -> Result<(), SkeinError> {
        validate_id(first.as_str())?;
        validate_id(second.as_str())?;
        if first == second {
            return Err(SkeinError::SelfLoop(first.clone()));
        }

        // Both half-edges land in one transaction.
        self.insert_keys(&[edge_key(first, second), edge_key(second, first)])
    }

    fn edge_exists(&self, src: &EntityId, dst: &EntityId) -> Result<bool, SkeinError> {
        self.key_exists(edge_key(src, dst).as_str())
    }

    fn adjacent(&self, id: &EntityId) -> Result<EntityIdSet, SkeinError> {
        if !self.has_entity(id)? {
            return Err(SkeinError::EntityNotFound(id.clone()));
        }

        let lower = format!("{EDGE_PREFIX}#{id}#");
        let upper = format!("{EDGE_PREFIX}#{id}$");

        let mut destinations = EntityIdSet::new();
        for key in self.keys_in_range(&lower, &upper)? {
            let dst = Self::split_edge_key(&key, id.as_str())?;
            destinations.insert(EntityId::new(dst));
        }
        Ok(destinations)
    }

    fn entity_ids(&self) -> Result<EntityIdSet, SkeinError> {
        let mut ids = EntityIdSet::new();

        let vertex_marker = format!("{VERTEX_PREFIX}#");
        for key in self.keys_in_range(&vertex_marker, &format!("{VERTEX_PREFIX}$"))? {
            match key.strip_prefix(&vertex_marker) {
                Some(id) => {
                    ids.insert(EntityId::new(id));
                }
                None => return Err(SkeinError::MalformedKey(key)),
            }
        }

        for key in self.keys_in_range(&format!("{EDGE_PREFIX}#"), &format!("{EDGE_PREFIX}$"))? {
            let parts: Vec<&str> = key.split('#').collect();
            match parts.as_slice() {
                [EDGE_PREFIX, src, _dst] => {
                    ids.insert(EntityId::new(*src));
                }
                _ => return Err(SkeinError::MalformedKey(key)),
            }
        }

        Ok(ids)
    }

    fn has_entity(&self, id: &EntityId) -> Result<bool, SkeinError> {
        if self.key_exists(vertex_key(id).as_str())? {
            return Ok(true);
        }

        let lower = format!("{EDGE_PREFIX}#{id}#");
        let upper = format!("{EDGE_PREFIX}#{id}$");
        Ok(!self.keys_in_range(&lower, &upper)?.is_empty())
    }

    fn number_of_entities(&self) -> Result<usize, SkeinError> {
        Ok(self.entity_ids()?.len())
    }

    fn clear(&self) -> Result<(), SkeinError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        write_txn
            .delete_table(UNIPARTITE)
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        let _ = write_txn
            .open_table(UNIPARTITE)
            .map_err(|e| SkeinError::Storage(e.to_string()))?;
        write_txn
            .commit()
            .map_err(|e| SkeinError::Storage(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "cleared unipartite store");
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

        tracing::debug!(path = %path.display(), "destroyed unipartite store");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
