//! End-to-end test infrastructure for semindex.
//!
//! Provides a shared TestHarness and seeded vector generators for tests
//! covering the full insert, query and snapshot pipeline.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use semindex_vector::{EngineConfig, ExternalId, IndexEngine};

/// Shared test harness for E2E tests.
///
/// Owns a temp directory for snapshot files and the engine config used
/// by the scenario.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Path for snapshot files
    pub snapshot_path: PathBuf,
    /// Engine config for engines built by this harness
    pub config: EngineConfig,
}

impl TestHarness {
    /// Create a new test harness with the default engine config.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a harness whose engines use `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let snapshot_path = temp_dir.path().join("snapshots").join("index.json");

        Self {
            _temp_dir: temp_dir,
            snapshot_path,
            config,
        }
    }

    /// Fresh, empty engine.
    pub fn engine(&self) -> IndexEngine {
        IndexEngine::new(self.config.clone())
    }

    /// Engine pre-loaded with `count` seeded vectors, ids `0..count`.
    pub fn populated_engine(&self, seed: u64, count: usize, dim: usize) -> IndexEngine {
        let mut engine = self.engine();
        let (ids, vectors) = create_dataset(seed, count, dim, 0);
        engine
            .insert(&ids, &vectors)
            .expect("Failed to insert dataset");
        engine
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate `count` vectors of `dim` components, uniform in [-1, 1).
///
/// The same seed always yields the same vectors.
pub fn random_vectors(seed: u64, count: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dim).map(|_| rng.random_range(-1.0..1.0)).collect())
        .collect()
}

/// Seeded dataset with sequential ids starting at `first_id`.
pub fn create_dataset(
    seed: u64,
    count: usize,
    dim: usize,
    first_id: ExternalId,
) -> (Vec<ExternalId>, Vec<Vec<f32>>) {
    let ids = (first_id..first_id + count as u64).collect();
    (ids, random_vectors(seed, count, dim))
}

/// Squared Euclidean distance, matching the engine's default metric.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Brute-force nearest id for `query` over `vectors`.
pub fn exact_nearest(ids: &[ExternalId], vectors: &[Vec<f32>], query: &[f32]) -> ExternalId {
    let mut best = (ids[0], f32::INFINITY);
    for (id, vector) in ids.iter().zip(vectors) {
        let distance = squared_l2(vector, query);
        if distance < best.1 {
            best = (*id, distance);
        }
    }
    best.0
}
