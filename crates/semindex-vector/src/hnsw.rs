//! HNSW index implementation using usearch.
//!
//! Defaults follow the engine's single quality knob:
//! - M = 16 (connections per layer)
//! - ef = 32 for both construction and search
//!
//! Keys handed to usearch are the engine's internal positions, so the
//! graph never sees external identifiers.

use semindex_types::{DistanceMetric, Settings};
use tracing::{debug, info};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::error::VectorError;
use crate::index::{AnnBuilder, AnnIndex, Neighbor};

/// Default HNSW quality parameter
pub const DEFAULT_EF: usize = 32;

/// HNSW index configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HnswConfig {
    /// Distance metric
    pub metric: DistanceMetric,
    /// Number of connections per layer (M parameter)
    pub connectivity: usize,
    /// Build-time search depth (ef_construction)
    pub expansion_add: usize,
    /// Query-time search depth (ef_search)
    pub expansion_search: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Euclidean,
            connectivity: 16,
            expansion_add: DEFAULT_EF,
            expansion_search: DEFAULT_EF,
        }
    }
}

impl HnswConfig {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            metric: settings.metric,
            connectivity: settings.connectivity,
            expansion_add: settings.ef,
            expansion_search: settings.ef,
        }
    }

    /// Set construction and search depth together
    pub fn with_ef(self, ef: usize) -> Self {
        self.with_expansion(ef, ef)
    }

    pub fn with_connectivity(mut self, m: usize) -> Self {
        self.connectivity = m;
        self
    }

    pub fn with_expansion(mut self, ef_add: usize, ef_search: usize) -> Self {
        self.expansion_add = ef_add;
        self.expansion_search = ef_search;
        self
    }

    fn options(&self, dimension: usize) -> IndexOptions {
        IndexOptions {
            dimensions: dimension,
            metric: metric_kind(self.metric),
            quantization: ScalarKind::F32,
            connectivity: self.connectivity,
            expansion_add: self.expansion_add,
            expansion_search: self.expansion_search,
            multi: false,
        }
    }
}

impl AnnBuilder for HnswConfig {
    fn build(&self, dimension: usize) -> Result<Box<dyn AnnIndex>, VectorError> {
        Ok(Box::new(HnswIndex::new(dimension, self.clone())?))
    }
}

fn metric_kind(metric: DistanceMetric) -> MetricKind {
    match metric {
        DistanceMetric::Euclidean => MetricKind::L2sq,
        DistanceMetric::Cosine => MetricKind::Cos,
        DistanceMetric::InnerProduct => MetricKind::IP,
    }
}

/// HNSW index wrapper around usearch.
pub struct HnswIndex {
    index: Index,
    dimension: usize,
    config: HnswConfig,
}

impl HnswIndex {
    /// Create an empty in-memory index.
    pub fn new(dimension: usize, config: HnswConfig) -> Result<Self, VectorError> {
        if dimension == 0 {
            return Err(VectorError::ZeroDimension);
        }

        let index =
            Index::new(&config.options(dimension)).map_err(|e| VectorError::Index(e.to_string()))?;

        info!(
            dim = dimension,
            metric = %config.metric,
            m = config.connectivity,
            ef_add = config.expansion_add,
            ef_search = config.expansion_search,
            "Created HNSW index"
        );

        Ok(Self {
            index,
            dimension,
            config,
        })
    }

    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Slots usearch has reserved
    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }
}

impl AnnIndex for HnswIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.index.size()
    }

    fn reserve(&mut self, capacity: usize) -> Result<(), VectorError> {
        if capacity <= self.index.capacity() {
            return Ok(());
        }
        self.index
            .reserve(capacity)
            .map_err(|e| VectorError::Index(format!("Failed to reserve {}: {}", capacity, e)))?;
        debug!(capacity, "Reserved HNSW capacity");
        Ok(())
    }

    fn add(&mut self, vectors: &[f32]) -> Result<(), VectorError> {
        if vectors.len() % self.dimension != 0 {
            return Err(VectorError::Index(format!(
                "{} floats is not a whole number of {}-dimensional rows",
                vectors.len(),
                self.dimension
            )));
        }

        let rows = vectors.len() / self.dimension;
        let start = self.index.size();
        self.reserve(start + rows)?;

        for (offset, vector) in vectors.chunks_exact(self.dimension).enumerate() {
            let key = (start + offset) as u64;
            self.index
                .add(key, vector)
                .map_err(|e| VectorError::Index(format!("Failed to add {}: {}", key, e)))?;
        }

        debug!(start, rows, "Added vectors to HNSW index");
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        if self.index.size() == 0 {
            return Err(VectorError::NotInitialized);
        }
        if query.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        // usearch allocates k result slots up front
        let k = k.min(self.index.size());
        let matches = self
            .index
            .search(query, k)
            .map_err(|e| VectorError::Index(e.to_string()))?;

        let size = self.index.size() as u64;
        let neighbors: Vec<Neighbor> = matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter(|(key, _)| **key < size)
            .map(|(&key, &distance)| Neighbor::new(key as usize, distance))
            .collect();

        debug!(k, found = neighbors.len(), "Search complete");
        Ok(neighbors)
    }

    fn name(&self) -> &'static str {
        "hnsw"
    }
}
