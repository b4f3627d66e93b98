//! # Path Finding Across Entity Sets
//!
//! Enumerates bounded simple paths between every pair of entities drawn from
//! named entity sets, and aggregates them into a [`NetworkConnections`]
//! result: a source -> destination -> paths map plus a tag of every
//! requested entity with every set name that mentioned it.
//!
//! A connection is stored once per unordered pair; `has_connection` is
//! symmetric even though storage is one-directional.

use crate::paths::{Path, all_paths_resilient, paths_equal};
use crate::types::{EntityId, SkeinError};
use crate::unipartite::UnipartiteStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// ENTITY SET
// =============================================================================

/// A named, caller-supplied group of entity ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    /// Display name of the set, e.g. `Case-1`.
    pub name: String,
    /// The entity ids of interest.
    pub entity_ids: Vec<EntityId>,
}

impl EntitySet {
    /// Create a named entity set.
    #[must_use]
    pub fn new(name: impl Into<String>, entity_ids: Vec<EntityId>) -> Self {
        Self {
            name: name.into(),
            entity_ids,
        }
    }
}

// =============================================================================
// NETWORK CONNECTIONS
// =============================================================================

/// Aggregate result of path finding across entity sets.
///
/// Equality ignores the order of paths within a (source, destination)
/// bucket; two results are equal when every bucket holds a permutation of
/// the other's paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConnections {
    /// Every requested entity, tagged with each set name that mentioned it.
    pub entity_id_to_set_names: BTreeMap<EntityId, BTreeSet<String>>,
    /// Source -> destination -> enumerated paths. One direction per
    /// unordered pair.
    pub connections: BTreeMap<EntityId, BTreeMap<EntityId, Vec<Path>>>,
    /// The hop bound the paths were enumerated under.
    pub max_hops: usize,
}

impl NetworkConnections {
    /// Create an empty result for the given hop bound.
    ///
    /// Fails with `InvalidHops` when `max_hops` is zero; zero-hop behavior
    /// exists only as the enumerator's root == goal special case.
    pub fn new(max_hops: usize) -> Result<Self, SkeinError> {
        if max_hops < 1 {
            return Err(SkeinError::InvalidHops(max_hops));
        }
        Ok(Self {
            entity_id_to_set_names: BTreeMap::new(),
            connections: BTreeMap::new(),
            max_hops,
        })
    }

    /// Tag an entity with the name of a set that mentioned it.
    pub fn add_entity_set_name(&mut self, id: &EntityId, set_name: &str) {
        self.entity_id_to_set_names
            .entry(id.clone())
            .or_default()
            .insert(set_name.to_string());
    }

    /// True when paths are stored for the pair in either direction.
    #[must_use]
    pub fn has_connection(&self, first: &EntityId, second: &EntityId) -> bool {
        self.connections
            .get(first)
            .is_some_and(|destinations| destinations.contains_key(second))
            || self
                .connections
                .get(second)
                .is_some_and(|destinations| destinations.contains_key(first))
    }

    /// Store paths for a pair. Self-pairs, empty path lists and pairs
    /// already stored in either direction are skipped.
    pub fn add_paths(&mut self, source: &EntityId, destination: &EntityId, paths: Vec<Path>) {
        if source == destination || paths.is_empty() || self.has_connection(source, destination)
        {
            return;
        }
        self.connections
            .entry(source.clone())
            .or_default()
            .insert(destination.clone(), paths);
    }

    /// Total number of stored (source, destination) buckets.
    #[must_use]
    pub fn number_of_connections(&self) -> usize {
        self.connections
            .values()
            .map(|destinations| destinations.len())
            .sum()
    }
}

impl PartialEq for NetworkConnections {
    fn eq(&self, other: &Self) -> bool {
        if self.max_hops != other.max_hops
            || self.entity_id_to_set_names != other.entity_id_to_set_names
            || self.connections.len() != other.connections.len()
        {
            return false;
        }

        for (source, destinations) in &self.connections {
            let Some(other_destinations) = other.connections.get(source) else {
                return false;
            };
            if destinations.len() != other_destinations.len() {
                return false;
            }
            for (destination, paths) in destinations {
                let Some(other_paths) = other_destinations.get(destination) else {
                    return false;
                };
                if !paths_equal(paths, other_paths) {
                    return false;
                }
            }
        }
        true
    }
}

impl Eq for NetworkConnections {}

// =============================================================================
// PATH FINDER
// =============================================================================

/// Pairwise bounded path enumeration across named entity sets.
#[derive(Debug)]
pub struct PathFinder<'a, G: UnipartiteStore + ?Sized> {
    graph: &'a G,
}

impl<'a, G: UnipartiteStore + ?Sized> PathFinder<'a, G> {
    /// Create a path finder over the given unipartite graph.
    #[must_use]
    pub fn new(graph: &'a G) -> Self {
        Self { graph }
    }

    /// Enumerate paths between entities of the supplied sets.
    ///
    /// With a single set, unordered pairs within that set are searched;
    /// with several, unordered pairs of distinct sets. Every requested
    /// entity is tagged with its set names whether or not paths are found.
    pub fn find_paths(
        &self,
        entity_sets: &[EntitySet],
        max_hops: usize,
    ) -> Result<NetworkConnections, SkeinError> {
        if entity_sets.is_empty() {
            return Err(SkeinError::NoEntitySets);
        }
        for set in entity_sets {
            if set.name.is_empty() {
                return Err(SkeinError::NoNameForEntitySet);
            }
            if set.entity_ids.is_empty() {
                return Err(SkeinError::EmptyEntitySet(set.name.clone()));
            }
        }

        let mut connections = NetworkConnections::new(max_hops)?;

        if entity_sets.len() == 1 {
            if let Some(only) = entity_sets.first() {
                self.find_between_sets(&mut connections, only, only)?;
            }
        } else {
            for (index, set_a) in entity_sets.iter().enumerate() {
                for set_b in entity_sets.iter().skip(index + 1) {
                    self.find_between_sets(&mut connections, set_a, set_b)?;
                }
            }
        }

        tracing::debug!(
            sets = entity_sets.len(),
            max_hops,
            connections = connections.number_of_connections(),
            "path finding complete"
        );
        Ok(connections)
    }

    /// Search the cross product of two sets (which may be the same set).
    fn find_between_sets(
        &self,
        connections: &mut NetworkConnections,
        set_a: &EntitySet,
        set_b: &EntitySet,
    ) -> Result<(), SkeinError> {
        for source in &set_a.entity_ids {
            connections.add_entity_set_name(source, &set_a.name);

            for destination in &set_b.entity_ids {
                connections.add_entity_set_name(destination, &set_b.name);

                if source == destination || connections.has_connection(source, destination) {
                    continue;
                }

                let paths =
                    all_paths_resilient(self.graph, source, destination, connections.max_hops)?;
                connections.add_paths(source, destination, paths);
            }
        }
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
    use crate::unipartite::InMemoryUnipartiteStore;

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    fn path(vertices: &[&str]) -> Path {
        Path::new(vertices.iter().map(|v| id(v)).collect())
    }

    /// Line graph 1-2-3 with isolated 9.
    fn line() -> InMemoryUnipartiteStore {
        let graph = InMemoryUnipartiteStore::new();
        graph.add_undirected(&id("1"), &id("2")).expect("edge");
        graph.add_undirected(&id("2"), &id("3")).expect("edge");
        graph.add_entity(&id("9")).expect("vertex");
        graph
    }

    #[test]
    fn zero_hops_is_rejected() {
        assert!(matches!(
            NetworkConnections::new(0),
            Err(SkeinError::InvalidHops(0))
        ));
    }

    #[test]
    fn validation_rejects_bad_sets() {
        let graph = line();
        let finder = PathFinder::new(&graph);

        assert!(matches!(
            finder.find_paths(&[], 2),
            Err(SkeinError::NoEntitySets)
        ));
        assert!(matches!(
            finder.find_paths(&[EntitySet::new("", vec![id("1")])], 2),
            Err(SkeinError::NoNameForEntitySet)
        ));
        assert!(matches!(
            finder.find_paths(&[EntitySet::new("Set-1", vec![])], 2),
            Err(SkeinError::EmptyEntitySet(_))
        ));
    }

    #[test]
    fn has_connection_is_symmetric() {
        let mut connections = NetworkConnections::new(2).expect("connections");
        connections.add_paths(&id("1"), &id("3"), vec![path(&["1", "2", "3"])]);

        assert!(connections.has_connection(&id("1"), &id("3")));
        assert!(connections.has_connection(&id("3"), &id("1")));
        assert!(!connections.has_connection(&id("1"), &id("2")));
    }

    #[test]
    fn reverse_pair_is_not_stored_twice() {
        let mut connections = NetworkConnections::new(2).expect("connections");
        connections.add_paths(&id("1"), &id("3"), vec![path(&["1", "2", "3"])]);
        connections.add_paths(&id("3"), &id("1"), vec![path(&["3", "2", "1"])]);

        assert_eq!(connections.number_of_connections(), 1);
    }

    #[test]
    fn equality_ignores_path_order() {
        let make = |reversed: bool| {
            let mut connections = NetworkConnections::new(3).expect("connections");
            let mut paths = vec![path(&["1", "2", "4"]), path(&["1", "3", "4"])];
            if reversed {
                paths.reverse();
            }
            connections.add_paths(&id("1"), &id("4"), paths);
            connections.add_entity_set_name(&id("1"), "Set-1");
            connections
        };

        assert_eq!(make(false), make(true));
    }

    #[test]
    fn equality_respects_content() {
        let mut a = NetworkConnections::new(3).expect("connections");
        a.add_paths(&id("1"), &id("4"), vec![path(&["1", "2", "4"])]);

        let mut b = NetworkConnections::new(3).expect("connections");
        b.add_paths(&id("1"), &id("4"), vec![path(&["1", "3", "4"])]);

        assert_ne!(a, b);
    }

    #[test]
    fn single_set_searches_within_itself() {
        let graph = line();
        let finder = PathFinder::new(&graph);

        let connections = finder
            .find_paths(&[EntitySet::new("Set-1", vec![id("1"), id("3")])], 2)
            .expect("find");

        assert!(connections.has_connection(&id("1"), &id("3")));
        assert_eq!(connections.number_of_connections(), 1);
    }

    #[test]
    fn every_requested_entity_is_tagged() {
        let graph = line();
        let finder = PathFinder::new(&graph);

        // "9" is isolated and "missing" is absent from the graph entirely;
        // both still get tagged.
        let connections = finder
            .find_paths(
                &[
                    EntitySet::new("Set-1", vec![id("1"), id("missing")]),
                    EntitySet::new("Set-2", vec![id("3"), id("9")]),
                ],
                2,
            )
            .expect("find");

        let names_of = |entity: &str| {
            connections
                .entity_id_to_set_names
                .get(&id(entity))
                .cloned()
                .unwrap_or_default()
        };
        assert_eq!(names_of("1"), ["Set-1".to_string()].into_iter().collect());
        assert_eq!(
            names_of("missing"),
            ["Set-1".to_string()].into_iter().collect()
        );
        assert_eq!(names_of("9"), ["Set-2".to_string()].into_iter().collect());

        assert!(connections.has_connection(&id("1"), &id("3")));
        assert!(!connections.has_connection(&id("1"), &id("9")));
    }

    #[test]
    fn entity_in_both_sets_gets_both_names() {
        let graph = line();
        let finder = PathFinder::new(&graph);

        let connections = finder
            .find_paths(
                &[
                    EntitySet::new("Set-1", vec![id("1"), id("3")]),
                    EntitySet::new("Set-2", vec![id("1")]),
                ],
                2,
            )
            .expect("find");

        assert_eq!(
            connections.entity_id_to_set_names.get(&id("1")),
            Some(
                &["Set-1".to_string(), "Set-2".to_string()]
                    .into_iter()
                    .collect()
            )
        );
    }

    #[test]
    fn no_self_connections_are_stored() {
        let graph = line();
        let finder = PathFinder::new(&graph);

        let connections = finder
            .find_paths(
                &[
                    EntitySet::new("Set-1", vec![id("1")]),
                    EntitySet::new("Set-2", vec![id("1")]),
                ],
                2,
            )
            .expect("find");

        assert_eq!(connections.number_of_connections(), 0);
    }
}
