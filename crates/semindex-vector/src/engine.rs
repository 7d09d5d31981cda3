//! Index engine.
//!
//! Owns the vector store and the ANN backend and keeps them in lockstep:
//! every committed batch is appended to the store and then added to the
//! backend, so store position `i` and ANN position `i` are the same
//! insertion. Queries go through the backend and come back out through the
//! store's identifier array.

use std::ops::Range;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::batch::BatchSplitter;
use crate::config::EngineConfig;
use crate::error::VectorError;
use crate::index::{AnnBuilder, AnnIndex};
use crate::store::{validate_batch, validate_vector, ExternalId, GrowthPolicy, VectorStore};

/// A ranked query result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Caller-supplied identifier of the matched vector
    pub id: ExternalId,
    /// Distance under the configured metric (lower = closer)
    pub distance: f32,
}

impl SearchHit {
    pub fn new(id: ExternalId, distance: f32) -> Self {
        Self { id, distance }
    }
}

/// Statistics from an insert call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InsertStats {
    /// Pairs committed
    pub inserted: usize,
    /// Batches committed
    pub batches: usize,
    /// Store reallocations triggered
    pub reallocations: usize,
}

impl InsertStats {
    /// Merge another stats into this one
    pub fn merge(&mut self, other: &InsertStats) {
        self.inserted += other.inserted;
        self.batches += other.batches;
        self.reallocations += other.reallocations;
    }
}

/// Index statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of stored vectors
    pub vector_count: usize,
    /// Latched dimension, if any
    pub dimension: Option<usize>,
    /// Store capacity in vectors
    pub capacity: usize,
    /// Number of vectors in the ANN backend
    pub ann_len: usize,
    /// Store reallocations since creation
    pub reallocations: usize,
    /// ANN backend name, once built
    pub backend: Option<&'static str>,
    /// Whether the index can answer queries
    pub available: bool,
}

/// Lifecycle state of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing inserted yet
    Empty,
    /// Dimension latched, no vectors held
    Dimensioned,
    /// At least one vector held
    Populated,
}

/// Append-only vector index with an ANN search structure.
pub struct IndexEngine {
    config: EngineConfig,
    builder: Arc<dyn AnnBuilder>,
    store: VectorStore,
    ann: Option<Box<dyn AnnIndex>>,
}

impl std::fmt::Debug for IndexEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexEngine")
            .field("config", &self.config)
            .field("len", &self.store.len())
            .field("dimension", &self.store.dimension())
            .field("backend", &self.ann.as_ref().map(|ann| ann.name()))
            .finish()
    }
}

impl Default for IndexEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl IndexEngine {
    /// Create an empty engine backed by usearch HNSW.
    pub fn new(config: EngineConfig) -> Self {
        let builder = Arc::new(config.hnsw.clone());
        Self::with_backend(config, builder)
    }

    /// Create an empty engine with a custom ANN backend.
    pub fn with_backend(config: EngineConfig, builder: Arc<dyn AnnBuilder>) -> Self {
        let store = VectorStore::new(config.growth);
        Self {
            config,
            builder,
            store,
            ann: None,
        }
    }

    /// Change the store's over-allocation policy for later growth steps.
    ///
    /// Lets a caller retry with a smaller factor after `CapacityGrowth`.
    pub fn set_growth(&mut self, growth: GrowthPolicy) {
        self.config.growth = growth;
        self.store.set_growth(growth);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn builder(&self) -> Arc<dyn AnnBuilder> {
        Arc::clone(&self.builder)
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Dimension latched by the first successful insert
    pub fn dimension(&self) -> Option<usize> {
        self.store.dimension()
    }

    /// Store capacity in vectors
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn state(&self) -> EngineState {
        match (self.store.dimension(), self.store.is_empty()) {
            (None, _) => EngineState::Empty,
            (Some(_), true) => EngineState::Dimensioned,
            (Some(_), false) => EngineState::Populated,
        }
    }

    /// Read-only view of the stored pairs
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Identifier and vector at an internal position
    pub fn get(&self, position: usize) -> Option<(ExternalId, &[f32])> {
        self.store.get(position)
    }

    pub fn stats(&self) -> IndexStats {
        let ann_len = self.ann.as_ref().map_or(0, |ann| ann.len());
        IndexStats {
            vector_count: self.store.len(),
            dimension: self.store.dimension(),
            capacity: self.store.capacity(),
            ann_len,
            reallocations: self.store.reallocations(),
            backend: self.ann.as_ref().map(|ann| ann.name()),
            available: ann_len > 0,
        }
    }

    /// Insert paired identifiers and vectors.
    ///
    /// The whole request is validated before anything is stored. It is then
    /// committed in batches of `batch_size`. If growth or the ANN backend
    /// fails on a batch, that batch is rolled back in full and earlier
    /// batches stay committed.
    pub fn insert<V: AsRef<[f32]>>(
        &mut self,
        ids: &[ExternalId],
        vectors: &[V],
    ) -> Result<InsertStats, VectorError> {
        let Some(dimension) = validate_batch(self.store.dimension(), ids, vectors)? else {
            debug!("Empty insert, nothing to do");
            return Ok(InsertStats::default());
        };

        let splitter = BatchSplitter::new(self.config.batch_size);
        let reallocations_before = self.store.reallocations();
        let mut stats = InsertStats::default();

        for (batch_ids, batch_vectors) in splitter.split(ids, vectors) {
            self.commit_batch(dimension, batch_ids, batch_vectors)?;
            stats.inserted += batch_ids.len();
            stats.batches += 1;
        }
        stats.reallocations = self.store.reallocations() - reallocations_before;

        info!(
            count = stats.inserted,
            batches = stats.batches,
            total = self.store.len(),
            capacity = self.store.capacity(),
            "Inserted vectors"
        );
        Ok(stats)
    }

    /// Insert from an unbounded stream of pairs, `batch_size` at a time.
    ///
    /// Each buffered batch goes through `insert`. A failing batch stops the
    /// stream; batches before it stay committed.
    pub fn insert_stream<I, V>(&mut self, pairs: I) -> Result<InsertStats, VectorError>
    where
        I: IntoIterator<Item = (ExternalId, V)>,
        V: AsRef<[f32]>,
    {
        let splitter = BatchSplitter::new(self.config.batch_size);
        let mut stats = InsertStats::default();

        for (ids, vectors) in splitter.chunk_stream(pairs) {
            match self.insert(&ids, &vectors) {
                Ok(batch_stats) => stats.merge(&batch_stats),
                Err(e) => {
                    warn!(committed = stats.inserted, error = %e, "Stream insert stopped");
                    return Err(e);
                }
            }
        }

        Ok(stats)
    }

    fn commit_batch<V: AsRef<[f32]>>(
        &mut self,
        dimension: usize,
        ids: &[ExternalId],
        vectors: &[V],
    ) -> Result<(), VectorError> {
        if self.store.dimension().is_none() && self.ann.take().is_some() {
            debug!("Dropped ANN index left over from an uncommitted insert");
        }
        if let Some(ann) = &self.ann {
            if ann.len() != self.store.len() || ann.dimension() != dimension {
                return Err(VectorError::Index(format!(
                    "ANN index holds {} vectors of dimension {} but store holds {} of dimension {}",
                    ann.len(),
                    ann.dimension(),
                    self.store.len(),
                    dimension
                )));
            }
        }

        // Growth failures return here, before any ANN work
        let range = self.store.append_validated(dimension, ids, vectors)?;

        if let Err(e) = self.index_rows(dimension, range.clone()) {
            self.roll_back(dimension, range.start);
            warn!(
                batch_start = range.start,
                batch_len = range.len(),
                kept = self.store.len(),
                error = %e,
                "ANN add failed, rolled batch back"
            );
            return Err(e);
        }

        debug!(start = range.start, len = range.len(), "Committed batch");
        Ok(())
    }

    /// Add stored rows to the ANN backend, building it on first use.
    fn index_rows(&mut self, dimension: usize, range: Range<usize>) -> Result<(), VectorError> {
        let ann = match &mut self.ann {
            Some(ann) => ann,
            slot @ None => {
                let built = self.builder.build(dimension)?;
                info!(dim = dimension, backend = built.name(), "Built ANN index");
                slot.insert(built)
            }
        };
        ann.reserve(self.store.capacity())?;
        ann.add(self.store.rows(range))
    }

    /// Return store and ANN backend to the first `committed` positions.
    ///
    /// Rows of the failed batch that reached the backend are removed by
    /// rebuilding it from the committed rows. If that rebuild fails too, the
    /// store is cut back to whatever the backend holds instead.
    fn roll_back(&mut self, dimension: usize, committed: usize) {
        let indexed = self.ann.as_ref().map_or(0, |ann| ann.len());
        if indexed > committed {
            if committed == 0 {
                self.ann = None;
            } else {
                match self.rebuild_ann(dimension, committed) {
                    Ok(ann) => self.ann = Some(ann),
                    Err(e) => {
                        warn!(error = %e, kept = indexed, "Failed to rebuild ANN index");
                        self.store.truncate(indexed);
                        return;
                    }
                }
            }
        }
        self.store.truncate(committed);
    }

    fn rebuild_ann(
        &self,
        dimension: usize,
        committed: usize,
    ) -> Result<Box<dyn AnnIndex>, VectorError> {
        let mut ann = self.builder.build(dimension)?;
        ann.reserve(self.store.capacity())?;
        ann.add(self.store.rows(0..committed))?;
        Ok(ann)
    }

    /// Find the k nearest stored vectors to `vector`, closest first.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorError> {
        let ann = self.searchable()?;
        validate_vector(ann.dimension(), vector)?;
        self.search_validated(ann, vector, k)
    }

    /// Answer several queries at once, one ranked list per query.
    ///
    /// Every query is validated before any search runs.
    pub fn query_batch<V: AsRef<[f32]>>(
        &self,
        queries: &[V],
        k: usize,
    ) -> Result<Vec<Vec<SearchHit>>, VectorError> {
        let ann = self.searchable()?;
        let dimension = ann.dimension();
        for (row, query) in queries.iter().enumerate() {
            validate_vector(dimension, query.as_ref()).map_err(|e| match e {
                VectorError::InvalidElement { column, .. } => {
                    VectorError::InvalidElement { row, column }
                }
                other => other,
            })?;
        }

        queries
            .iter()
            .map(|query| self.search_validated(ann, query.as_ref(), k))
            .collect()
    }

    fn searchable(&self) -> Result<&dyn AnnIndex, VectorError> {
        match &self.ann {
            Some(ann) if !ann.is_empty() => Ok(&**ann),
            _ => Err(VectorError::NotInitialized),
        }
    }

    fn search_validated(
        &self,
        ann: &dyn AnnIndex,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>, VectorError> {
        let k = k.min(ann.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        ann.search(vector, k)?
            .into_iter()
            .map(|neighbor| {
                self.store
                    .id_at(neighbor.position)
                    .map(|id| SearchHit::new(id, neighbor.distance))
                    .ok_or_else(|| {
                        VectorError::Index(format!(
                            "ANN returned unknown position {}",
                            neighbor.position
                        ))
                    })
            })
            .collect()
    }
}
