//! Snapshot and restore E2E tests for semindex.
//!
//! Saves engines to disk, reloads them, and checks that the rebuilt index
//! answers queries the same way the saved engine did.

use pretty_assertions::assert_eq;

use e2e_tests::{create_dataset, random_vectors, TestHarness};
use semindex_vector::{
    EngineConfig, EngineState, IndexEngine, PersistedState, VectorError, SNAPSHOT_FORMAT_VERSION,
};

/// Save to disk, load, restore: same ids and distances for fixed queries.
#[test]
fn test_file_round_trip_preserves_results() {
    let harness = TestHarness::new();
    let engine = harness.populated_engine(31, 1500, 12);

    engine.snapshot().save(&harness.snapshot_path).unwrap();
    let state = PersistedState::load(&harness.snapshot_path).unwrap();
    assert_eq!(state.format_version, SNAPSHOT_FORMAT_VERSION);

    let restored = IndexEngine::restore(&state, harness.config.clone()).unwrap();
    assert_eq!(restored.len(), engine.len());
    assert_eq!(restored.dimension(), Some(12));

    for query in random_vectors(32, 10, 12) {
        let before = engine.query(&query, 5).unwrap();
        let after = restored.query(&query, 5).unwrap();
        assert_eq!(
            before.iter().map(|h| h.id).collect::<Vec<_>>(),
            after.iter().map(|h| h.id).collect::<Vec<_>>()
        );
        for (a, b) in before.iter().zip(&after) {
            assert!((a.distance - b.distance).abs() < 1e-4);
        }
    }
}

/// Restored engines keep accepting inserts at the latched dimension.
#[test]
fn test_restored_engine_accepts_inserts() {
    let harness = TestHarness::new();
    let engine = harness.populated_engine(33, 100, 4);

    let bytes = engine.snapshot().to_bytes().unwrap();
    let state = PersistedState::from_bytes(&bytes).unwrap();
    let mut restored = IndexEngine::restore(&state, harness.config.clone()).unwrap();

    let (ids, vectors) = create_dataset(34, 50, 4, 100);
    restored.insert(&ids, &vectors).unwrap();
    assert_eq!(restored.len(), 150);
    assert_eq!(restored.query(&vectors[7], 1).unwrap()[0].id, 107);

    let result = restored.insert(&[999], &[vec![1.0f32; 5]]);
    assert!(matches!(result, Err(VectorError::DimensionMismatch { .. })));
}

/// Snapshot of an engine that never saw an insert restores empty.
#[test]
fn test_empty_engine_round_trip() {
    let harness = TestHarness::new();
    let engine = harness.engine();

    engine.snapshot().save(&harness.snapshot_path).unwrap();
    let state = PersistedState::load(&harness.snapshot_path).unwrap();
    assert_eq!(state.count, 0);
    assert_eq!(state.dimension, None);

    let restored = IndexEngine::restore(&state, EngineConfig::default()).unwrap();
    assert_eq!(restored.state(), EngineState::Empty);
    assert!(matches!(
        restored.query(&[0.0; 3], 1),
        Err(VectorError::NotInitialized)
    ));
}

/// Overwriting an existing snapshot replaces it in full.
#[test]
fn test_save_overwrites_previous_snapshot() {
    let harness = TestHarness::new();

    harness
        .populated_engine(35, 40, 3)
        .snapshot()
        .save(&harness.snapshot_path)
        .unwrap();
    harness
        .populated_engine(36, 10, 3)
        .snapshot()
        .save(&harness.snapshot_path)
        .unwrap();

    let state = PersistedState::load(&harness.snapshot_path).unwrap();
    assert_eq!(state.count, 10);
}

/// A truncated file is rejected rather than half-restored.
#[test]
fn test_corrupt_snapshot_rejected() {
    let harness = TestHarness::new();
    let engine = harness.populated_engine(37, 20, 3);

    let bytes = engine.snapshot().to_bytes().unwrap();
    let parent = harness.snapshot_path.parent().unwrap();
    std::fs::create_dir_all(parent).unwrap();
    std::fs::write(&harness.snapshot_path, &bytes[..bytes.len() / 2]).unwrap();

    let result = PersistedState::load(&harness.snapshot_path);
    assert!(matches!(result, Err(VectorError::Serialization(_))));
}

/// Restore with a different batch size and growth factor keeps the data.
#[test]
fn test_restore_under_new_config() {
    let harness = TestHarness::new();
    let engine = harness.populated_engine(38, 700, 6);

    let config = EngineConfig::default()
        .with_batch_size(50)
        .with_growth_factor(2);
    let restored = IndexEngine::restore(&engine.snapshot(), config).unwrap();

    assert_eq!(restored.store().ids(), engine.store().ids());
    assert_eq!(restored.store().as_flat(), engine.store().as_flat());
    assert_eq!(restored.config().batch_size, 50);
}
