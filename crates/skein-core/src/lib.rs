//! # skein-core
//!
//! Storage and traversal engine for entity network connectivity.
//!
//! Given sets of entities of interest drawn from disjoint datasets, skein
//! reveals how those entities are connected, up to a bounded number of hops,
//! inside a corpus of documents that mention entities. The corpus is a
//! bipartite graph of documents and entities; a derived unipartite
//! projection (entities linked when they co-occur in a document) is the
//! surface on which connectivity is computed.
//!
//! ## Components
//!
//! - `types` — identifiers, entity/document records, the error taxonomy
//! - `bipartite` — the corpus store (in-memory and redb-backed)
//! - `unipartite` — the projection store (in-memory and redb-backed)
//! - `projector` — derives the projection with a bounded worker pool
//! - `paths` — bounded all-simple-paths enumeration and reachability
//! - `connections` — pairwise path finding across named entity sets
//! - `spider` — N-step outward expansion from seed entities
//!
//! ## Architectural Constraints
//!
//! - Deterministic iteration: `BTreeMap`/`BTreeSet` only, no `HashMap`
//! - No async; the projector coordinates plain OS threads over a bounded
//!   crossbeam channel
//! - Every store ships an in-memory and a persistent implementation behind
//!   one behavioral contract, plus a tagged backend enum for selection from
//!   configuration

// =============================================================================
// MODULES
// =============================================================================

pub mod bipartite;
pub mod connections;
pub mod paths;
pub mod projector;
pub mod spider;
pub mod types;
pub mod unipartite;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    Attributes, Document, DocumentId, DocumentIdSet, Entity, EntityId, EntityIdSet, SkeinError,
    attributes, validate_id,
};

// =============================================================================
// RE-EXPORTS: Stores
// =============================================================================

pub use bipartite::{
    BipartiteBackend, BipartiteStore, InMemoryBipartiteStore, RedbBipartiteStore,
    bipartite_stores_equal,
};
pub use unipartite::{
    InMemoryUnipartiteStore, RedbUnipartiteStore, UnipartiteBackend, UnipartiteStore,
    unipartite_stores_equal,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use connections::{EntitySet, NetworkConnections, PathFinder};
pub use paths::{Path, all_paths, all_paths_resilient, paths_equal, reachable_within};
pub use projector::bipartite_to_unipartite;
pub use spider::{Spider, SpiderResults};
