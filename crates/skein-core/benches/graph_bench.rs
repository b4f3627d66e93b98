//! # Graph Benchmarks
//!
//! Performance benchmarks for skein-core projection and traversal.
//!
//! Run with: `cargo bench -p skein-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use skein_core::{
    Attributes, BipartiteStore, Document, DocumentId, Entity, EntityId, EntityIdSet,
    InMemoryBipartiteStore, InMemoryUnipartiteStore, PathFinder, Spider, UnipartiteStore,
    all_paths, bipartite_to_unipartite,
};
use skein_core::EntitySet;
use std::hint::black_box;

// =============================================================================
// HELPERS
// =============================================================================

fn vid(index: usize) -> EntityId {
    EntityId::new(format!("v{index}"))
}

/// Corpus of `documents` documents, each linking `span` consecutive
/// entities, so neighbouring documents overlap and the projection chains.
fn create_corpus(documents: usize, span: usize) -> InMemoryBipartiteStore {
    let corpus = InMemoryBipartiteStore::new();

    for index in 0..documents + span {
        corpus
            .add_entity(
                Entity::new(format!("v{index}"), "person", Attributes::new()).expect("entity"),
            )
            .expect("add entity");
    }

    for doc_index in 0..documents {
        let doc_id = format!("d{doc_index}");
        corpus
            .add_document(
                Document::new(doc_id.clone(), "report", Attributes::new()).expect("document"),
            )
            .expect("add document");
        for offset in 0..span {
            corpus
                .add_link(&vid(doc_index + offset), &DocumentId::new(doc_id.clone()))
                .expect("link");
        }
    }

    corpus
}

/// Ladder graph: two rails of `rungs` vertices with a rung between each
/// pair, giving the enumerator an exponential family of routes.
fn create_ladder(rungs: usize) -> InMemoryUnipartiteStore {
    let graph = InMemoryUnipartiteStore::new();
    let left = |i: usize| EntityId::new(format!("l{i}"));
    let right = |i: usize| EntityId::new(format!("r{i}"));

    for i in 0..rungs {
        graph.add_undirected(&left(i), &right(i)).expect("rung");
        if i + 1 < rungs {
            graph.add_undirected(&left(i), &left(i + 1)).expect("rail");
            graph.add_undirected(&right(i), &right(i + 1)).expect("rail");
        }
    }
    graph
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_projection(c: &mut Criterion) {
    let corpus = create_corpus(500, 4);

    let mut group = c.benchmark_group("projection");
    for workers in [1usize, 2, 4] {
        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |b, &workers| {
                b.iter(|| {
                    let unipartite = InMemoryUnipartiteStore::new();
                    bipartite_to_unipartite(
                        black_box(&corpus),
                        &unipartite,
                        &EntityIdSet::new(),
                        workers,
                        16,
                    )
                    .expect("project");
                    unipartite
                });
            },
        );
    }
    group.finish();
}

fn bench_all_paths(c: &mut Criterion) {
    let graph = create_ladder(12);
    let root = EntityId::new("l0");
    let goal = EntityId::new("r11");

    let mut group = c.benchmark_group("all_paths");
    for max_depth in [6usize, 10, 14] {
        group.bench_with_input(
            BenchmarkId::from_parameter(max_depth),
            &max_depth,
            |b, &max_depth| {
                b.iter(|| {
                    all_paths(black_box(&graph), &root, &goal, max_depth).expect("paths")
                });
            },
        );
    }
    group.finish();
}

fn bench_path_finder(c: &mut Criterion) {
    let graph = create_ladder(10);
    let finder = PathFinder::new(&graph);
    let sets = [
        EntitySet::new("Set-1", vec![EntityId::new("l0"), EntityId::new("l5")]),
        EntitySet::new("Set-2", vec![EntityId::new("r3"), EntityId::new("r9")]),
    ];

    c.bench_function("path_finder", |b| {
        b.iter(|| finder.find_paths(black_box(&sets), 6).expect("find"));
    });
}

fn bench_spider(c: &mut Criterion) {
    let corpus = create_corpus(500, 4);
    let graph = InMemoryUnipartiteStore::new();
    bipartite_to_unipartite(&corpus, &graph, &EntityIdSet::new(), 4, 16).expect("project");

    let spider = Spider::new(&graph);
    let seeds: EntityIdSet = [vid(10), vid(250)].into_iter().collect();

    c.bench_function("spider_two_steps", |b| {
        b.iter(|| spider.execute(2, black_box(&seeds)).expect("spider"));
    });
}

criterion_group!(
    benches,
    bench_projection,
    bench_all_paths,
    bench_path_finder,
    bench_spider
);
criterion_main!(benches);
