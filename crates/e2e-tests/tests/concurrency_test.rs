//! Concurrent access E2E tests for semindex.
//!
//! One writer and many readers share a `SharedIndexEngine` across blocking
//! tasks. Readers must never observe a partially committed batch.

use pretty_assertions::assert_eq;

use e2e_tests::{create_dataset, random_vectors};
use semindex_vector::{EngineConfig, IndexEngine, SharedIndexEngine};

/// Readers run alongside a writer that keeps forcing reallocations.
#[tokio::test]
async fn test_readers_during_growth() {
    let config = EngineConfig::default()
        .with_batch_size(32)
        .with_growth_factor(1);
    let shared = SharedIndexEngine::new(IndexEngine::new(config));
    let (ids, vectors) = create_dataset(41, 10, 8, 0);
    shared.insert(&ids, &vectors).unwrap();

    let writer = {
        let shared = shared.clone();
        tokio::task::spawn_blocking(move || {
            for round in 1..=30u64 {
                let (ids, vectors) = create_dataset(round, 40, 8, round * 100);
                shared.insert(&ids, &vectors).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4u64)
        .map(|seed| {
            let shared = shared.clone();
            tokio::task::spawn_blocking(move || {
                for query in random_vectors(seed + 100, 50, 8) {
                    let hits = shared.query(&query, 5).unwrap();
                    assert!(!hits.is_empty());
                    let stats = shared.stats().unwrap();
                    assert_eq!(stats.vector_count, stats.ann_len);
                    assert!(stats.vector_count <= stats.capacity);
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    assert_eq!(shared.len().unwrap(), 10 + 30 * 40);
}

/// Batch queries from several tasks see the same results.
#[tokio::test]
async fn test_parallel_batch_queries_agree() {
    let shared = SharedIndexEngine::new(IndexEngine::default());
    let (ids, vectors) = create_dataset(42, 500, 6, 0);
    shared.insert(&ids, &vectors).unwrap();

    let queries = random_vectors(43, 16, 6);
    let expected = shared.query_batch(&queries, 3).unwrap();

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            let queries = queries.clone();
            tokio::task::spawn_blocking(move || shared.query_batch(&queries, 3).unwrap())
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), expected);
    }
}

/// Restoring through the shared handle swaps in the snapshot's contents.
#[tokio::test]
async fn test_shared_restore() {
    let shared = SharedIndexEngine::new(IndexEngine::default());
    let (ids, vectors) = create_dataset(44, 100, 4, 0);
    shared.insert(&ids, &vectors).unwrap();
    let state = shared.snapshot().unwrap();

    let (more_ids, more_vectors) = create_dataset(45, 100, 4, 100);
    shared.insert(&more_ids, &more_vectors).unwrap();
    assert_eq!(shared.len().unwrap(), 200);

    let restorer = {
        let shared = shared.clone();
        tokio::task::spawn_blocking(move || shared.restore(&state))
    };
    restorer.await.unwrap().unwrap();

    assert_eq!(shared.len().unwrap(), 100);
    assert_eq!(shared.query(&vectors[42], 1).unwrap()[0].id, 42);
}
