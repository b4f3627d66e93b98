//! # Full Pipeline
//!
//! Load a corpus into the persistent bipartite store, derive the projection
//! into the persistent unipartite store with a worker pool, and run the
//! connectivity queries over the result — the complete data flow, all on
//! disk-backed storage.

#![allow(clippy::unwrap_used, clippy::panic)]

use skein_core::{
    Attributes, BipartiteStore, Document, DocumentId, Entity, EntityId, EntityIdSet, EntitySet,
    InMemoryUnipartiteStore, Path, PathFinder, RedbBipartiteStore, RedbUnipartiteStore, Spider,
    UnipartiteStore, bipartite_to_unipartite, paths_equal, unipartite_stores_equal,
};
use tempfile::tempdir;

fn id(s: &str) -> EntityId {
    EntityId::new(s)
}

/// Corpus whose projection is the path 1-2-3-4 with a spur 5 off 3:
///
/// - d-1 mentions {1, 2}
/// - d-2 mentions {2, 3}
/// - d-3 mentions {3, 4, 5}
/// - d-4 mentions {6} alone
fn load_corpus(store: &impl BipartiteStore) {
    for index in 1..=6 {
        store
            .add_entity(
                Entity::new(format!("{index}"), "person", Attributes::new()).expect("entity"),
            )
            .expect("add entity");
    }
    for (doc, linked) in [
        ("d-1", vec!["1", "2"]),
        ("d-2", vec!["2", "3"]),
        ("d-3", vec!["3", "4", "5"]),
        ("d-4", vec!["6"]),
    ] {
        store
            .add_document(Document::new(doc, "report", Attributes::new()).expect("document"))
            .expect("add document");
        for entity in linked {
            store
                .add_link(&id(entity), &DocumentId::new(doc))
                .expect("link");
        }
    }
}

#[test]
fn corpus_to_connections_on_persistent_stores() {
    let temp = tempdir().expect("temp dir");
    let bipartite =
        RedbBipartiteStore::open(temp.path().join("bipartite.redb")).expect("open bipartite");
    let unipartite =
        RedbUnipartiteStore::open(temp.path().join("unipartite.redb")).expect("open unipartite");

    load_corpus(&bipartite);
    assert_eq!(bipartite.number_of_entities().expect("count"), 6);
    assert_eq!(bipartite.number_of_documents().expect("count"), 4);
    assert_eq!(
        bipartite.number_of_entities_with_documents().expect("count"),
        6
    );

    bipartite_to_unipartite(&bipartite, &unipartite, &EntityIdSet::new(), 4, 8)
        .expect("project");

    // Projection shape: chain 1-2-3-4 with 4-5 and 3-5 from d-3, 6 alone.
    let expected = InMemoryUnipartiteStore::new();
    for (a, b) in [("1", "2"), ("2", "3"), ("3", "4"), ("3", "5"), ("4", "5")] {
        expected.add_undirected(&id(a), &id(b)).expect("edge");
    }
    expected.add_entity(&id("6")).expect("vertex");
    assert!(unipartite_stores_equal(&unipartite, &expected).expect("equal"));

    // Path finding across two sets over the projection.
    let finder = PathFinder::new(&unipartite);
    let connections = finder
        .find_paths(
            &[
                EntitySet::new("Case-A", vec![id("1"), id("6")]),
                EntitySet::new("Case-B", vec![id("4")]),
            ],
            3,
        )
        .expect("find");

    assert!(connections.has_connection(&id("1"), &id("4")));
    assert!(!connections.has_connection(&id("6"), &id("4")));

    let bucket = connections
        .connections
        .get(&id("1"))
        .and_then(|destinations| destinations.get(&id("4")))
        .expect("1-4 bucket");
    assert!(paths_equal(
        bucket,
        &[Path::new(vec![id("1"), id("2"), id("3"), id("4")])]
    ));

    // Spidering from 5 one step picks up the d-3 co-occurrences.
    let spider = Spider::new(&unipartite);
    let seeds: EntityIdSet = [id("5")].into_iter().collect();
    let results = spider.execute(1, &seeds).expect("spider");
    assert_eq!(
        results.subgraph.entity_ids().expect("ids"),
        [id("3"), id("4"), id("5")].into_iter().collect::<EntityIdSet>()
    );

    // Projection into a skip-filtered store drops the skipped entity's
    // co-occurrences entirely.
    let filtered =
        RedbUnipartiteStore::open(temp.path().join("filtered.redb")).expect("open filtered");
    let skip: EntityIdSet = [id("3")].into_iter().collect();
    bipartite_to_unipartite(&bipartite, &filtered, &skip, 2, 4).expect("project filtered");

    assert!(!filtered.has_entity(&id("3")).expect("has"));
    assert!(filtered.edge_exists(&id("4"), &id("5")).expect("exists"));
    assert!(!filtered.edge_exists(&id("2"), &id("3")).expect("exists"));

    filtered.destroy().expect("destroy");
    unipartite.destroy().expect("destroy");
    bipartite.destroy().expect("destroy");
}

#[test]
fn clearing_the_projection_allows_a_rebuild() {
    let temp = tempdir().expect("temp dir");
    let bipartite =
        RedbBipartiteStore::open(temp.path().join("bipartite.redb")).expect("open bipartite");
    let unipartite =
        RedbUnipartiteStore::open(temp.path().join("unipartite.redb")).expect("open unipartite");

    load_corpus(&bipartite);
    bipartite_to_unipartite(&bipartite, &unipartite, &EntityIdSet::new(), 2, 4)
        .expect("project");
    let before = unipartite.entity_ids().expect("ids");

    unipartite.clear().expect("clear");
    assert_eq!(unipartite.number_of_entities().expect("count"), 0);

    bipartite_to_unipartite(&bipartite, &unipartite, &EntityIdSet::new(), 2, 4)
        .expect("re-project");
    assert_eq!(unipartite.entity_ids().expect("ids"), before);
}
