//! Configuration E2E tests for semindex.
//!
//! Loads layered settings from a file and builds an engine from them.

use std::fs;

use pretty_assertions::assert_eq;

use e2e_tests::create_dataset;
use semindex_types::{DistanceMetric, Settings};
use semindex_vector::{EngineConfig, IndexEngine};

/// Settings from a TOML file drive batching, growth and the metric.
#[test]
fn test_settings_file_drives_engine() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("semindex.toml");
    fs::write(
        &path,
        "batch_size = 25\ngrowth_factor = 2\nef = 48\nmetric = \"cosine\"\n",
    )
    .unwrap();

    let settings = Settings::load(path.to_str()).unwrap();
    assert_eq!(settings.batch_size, 25);
    assert_eq!(settings.metric, DistanceMetric::Cosine);

    let config = EngineConfig::from_settings(&settings);
    assert_eq!(config.hnsw.expansion_add, 48);
    assert_eq!(config.hnsw.expansion_search, 48);

    let mut engine = IndexEngine::new(config);
    let (ids, vectors) = create_dataset(51, 60, 5, 0);
    let stats = engine.insert(&ids, &vectors).unwrap();
    assert_eq!(stats.batches, 3);
    // 50 after the first batch, +20 for the trailing 10
    assert_eq!(engine.capacity(), 70);
    assert_eq!(engine.stats().backend, Some("hnsw"));

    let hits = engine.query(&vectors[3], 1).unwrap();
    assert_eq!(hits[0].id, 3);
    assert!(hits[0].distance.abs() < 1e-4);
}

/// Invalid settings are rejected at load time.
#[test]
fn test_invalid_settings_rejected() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("bad.toml");
    fs::write(&path, "batch_size = 0\n").unwrap();

    assert!(Settings::load(path.to_str()).is_err());
}
