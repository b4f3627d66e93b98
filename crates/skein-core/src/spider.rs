//! # Spider Expansion
//!
//! Outward walk from a set of seed entities, returning the induced subgraph
//! after a bounded number of steps.
//!
//! Seeds found in the full graph are induced as standalone vertices, edges
//! between found seeds are added regardless of the step count (including
//! zero), then each step expands every vertex currently in the subgraph by
//! one hop. The vertex snapshot is taken once per step, so step `i` expands
//! only vertices discovered by step `i - 1`.

use crate::types::{EntityIdSet, SkeinError};
use crate::unipartite::{InMemoryUnipartiteStore, UnipartiteStore, unipartite_stores_equal};

// =============================================================================
// RESULTS
// =============================================================================

/// Result of a spider run.
#[derive(Debug)]
pub struct SpiderResults {
    /// The number of expansion steps performed.
    pub number_steps: usize,
    /// The induced subgraph.
    pub subgraph: InMemoryUnipartiteStore,
    /// The seeds as supplied by the caller.
    pub seed_entities: EntityIdSet,
    /// Seeds absent from the full graph.
    pub seed_entities_not_found: EntityIdSet,
}

impl SpiderResults {
    /// Structural equality; subgraphs are compared by vertex and adjacency
    /// sets.
    pub fn equal(&self, other: &Self) -> Result<bool, SkeinError> {
        Ok(self.number_steps == other.number_steps
            && self.seed_entities == other.seed_entities
            && self.seed_entities_not_found == other.seed_entities_not_found
            && unipartite_stores_equal(&self.subgraph, &other.subgraph)?)
    }
}

// =============================================================================
// SPIDER
// =============================================================================

/// Seed induction and N-step outward expansion over a unipartite graph.
#[derive(Debug)]
pub struct Spider<'a, G: UnipartiteStore + ?Sized> {
    graph: &'a G,
}

impl<'a, G: UnipartiteStore + ?Sized> Spider<'a, G> {
    /// Create a spider over the given unipartite graph.
    #[must_use]
    pub fn new(graph: &'a G) -> Self {
        Self { graph }
    }

    /// Spider outward `number_steps` hops from the seed entities.
    ///
    /// Fails with `NoSeedEntities` when the seed set is empty. Seeds absent
    /// from the full graph are reported, not an error.
    pub fn execute(
        &self,
        number_steps: usize,
        seed_entities: &EntityIdSet,
    ) -> Result<SpiderResults, SkeinError> {
        if seed_entities.is_empty() {
            return Err(SkeinError::NoSeedEntities);
        }

        let subgraph = InMemoryUnipartiteStore::new();
        let mut found = EntityIdSet::new();
        let mut not_found = EntityIdSet::new();

        // Induce every findable seed, even those without edges.
        for seed in seed_entities {
            if self.graph.has_entity(seed)? {
                subgraph.add_entity(seed)?;
                found.insert(seed.clone());
            } else {
                not_found.insert(seed.clone());
            }
        }

        // Edges between seeds belong to the result at every step count.
        for seed in &found {
            for neighbour in self.graph.adjacent(seed)? {
                if found.contains(&neighbour) {
                    subgraph.add_undirected(seed, &neighbour)?;
                }
            }
        }

        for _step in 0..number_steps {
            // Snapshot once per step: newly discovered vertices wait for the
            // next step before they are expanded themselves.
            let snapshot = subgraph.entity_ids()?;
            for vertex in snapshot {
                for neighbour in self.graph.adjacent(&vertex)? {
                    subgraph.add_undirected(&vertex, &neighbour)?;
                }
            }
        }

        let vertices = subgraph.number_of_entities()?;
        tracing::debug!(
            steps = number_steps,
            seeds = seed_entities.len(),
            vertices,
            "spider complete"
        );

        Ok(SpiderResults {
            number_steps,
            subgraph,
            seed_entities: seed_entities.clone(),
            seed_entities_not_found: not_found,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
