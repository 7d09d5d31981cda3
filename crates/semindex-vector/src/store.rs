//! Growable vector store.
//!
//! Owns the raw vectors (row-major, one contiguous buffer) and the external
//! identifier of every insertion. Slot `i` of both buffers belongs to the
//! same insertion. Slots are assigned in insertion order and never reused.
//!
//! Growth over-allocates by a multiple of the incoming batch instead of
//! reallocating per element. Both buffers are reserved before any element
//! is written, so a failed allocation leaves the store untouched.

use std::ops::Range;

use tracing::debug;

use crate::error::VectorError;

/// Caller-supplied document/chunk identifier. Not required to be unique.
pub type ExternalId = u64;

/// Default over-allocation multiple
pub const DEFAULT_GROWTH_FACTOR: usize = 20;

/// How many slots to add when the store runs out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Multiple of the incoming batch length to add on growth
    pub factor: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl GrowthPolicy {
    pub fn new(factor: usize) -> Self {
        Self { factor }
    }

    /// Slots to add for a batch of `incoming` vectors. Never less than `incoming`.
    pub fn additional(&self, incoming: usize) -> usize {
        incoming.saturating_mul(self.factor).max(incoming)
    }
}

/// Check a batch against an expected dimension without touching any state.
///
/// Returns the batch dimension, or `None` for an empty batch.
pub fn validate_batch<V: AsRef<[f32]>>(
    expected: Option<usize>,
    ids: &[ExternalId],
    vectors: &[V],
) -> Result<Option<usize>, VectorError> {
    if ids.len() != vectors.len() {
        return Err(VectorError::LengthMismatch {
            ids: ids.len(),
            vectors: vectors.len(),
        });
    }

    let Some(first) = vectors.first() else {
        return Ok(None);
    };
    let dimension = expected.unwrap_or_else(|| first.as_ref().len());

    for (row, vector) in vectors.iter().enumerate() {
        check_row(dimension, row, vector.as_ref())?;
    }

    Ok(Some(dimension))
}

/// Check a single query vector against the store's dimension.
pub fn validate_vector(expected: usize, vector: &[f32]) -> Result<(), VectorError> {
    check_row(expected, 0, vector)
}

fn check_row(dimension: usize, row: usize, vector: &[f32]) -> Result<(), VectorError> {
    if vector.len() != dimension {
        return Err(VectorError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    if dimension == 0 {
        return Err(VectorError::ZeroDimension);
    }
    if let Some(column) = vector.iter().position(|v| !v.is_finite()) {
        return Err(VectorError::InvalidElement { row, column });
    }
    Ok(())
}

/// Append-only store of (identifier, vector) pairs.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    dimension: Option<usize>,
    capacity: usize,
    ids: Vec<ExternalId>,
    vectors: Vec<f32>,
    growth: GrowthPolicy,
    reallocations: usize,
}

impl VectorStore {
    pub fn new(growth: GrowthPolicy) -> Self {
        Self {
            growth,
            ..Default::default()
        }
    }

    /// Dimension latched by the first non-empty append
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Slots available before the next growth step
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn growth(&self) -> GrowthPolicy {
        self.growth
    }

    pub fn set_growth(&mut self, growth: GrowthPolicy) {
        self.growth = growth;
    }

    /// Number of growth reallocations performed so far
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    /// Validate and append a batch.
    ///
    /// Returns the positions assigned to the batch. Nothing is mutated when
    /// validation or growth fails.
    pub fn append<V: AsRef<[f32]>>(
        &mut self,
        ids: &[ExternalId],
        vectors: &[V],
    ) -> Result<Range<usize>, VectorError> {
        match validate_batch(self.dimension, ids, vectors)? {
            Some(dimension) => self.append_validated(dimension, ids, vectors),
            None => Ok(self.len()..self.len()),
        }
    }

    /// Append a batch that already passed `validate_batch` for `dimension`.
    pub(crate) fn append_validated<V: AsRef<[f32]>>(
        &mut self,
        dimension: usize,
        ids: &[ExternalId],
        vectors: &[V],
    ) -> Result<Range<usize>, VectorError> {
        let start = self.len();
        if ids.is_empty() {
            return Ok(start..start);
        }

        self.ensure_capacity(dimension, ids.len())?;

        if self.dimension.is_none() {
            debug!(dimension, "Latched store dimension");
            self.dimension = Some(dimension);
        }

        self.ids.extend_from_slice(ids);
        for vector in vectors {
            self.vectors.extend_from_slice(vector.as_ref());
        }

        Ok(start..self.len())
    }

    fn ensure_capacity(&mut self, dimension: usize, incoming: usize) -> Result<(), VectorError> {
        let needed = self.len().saturating_add(incoming);
        if needed <= self.capacity {
            return Ok(());
        }

        let new_capacity = self
            .capacity
            .saturating_add(self.growth.additional(incoming));

        // Reserve both buffers before committing the new capacity
        self.ids
            .try_reserve_exact(new_capacity - self.ids.len())
            .map_err(|source| VectorError::CapacityGrowth {
                requested: new_capacity,
                source,
            })?;
        self.vectors
            .try_reserve_exact(
                new_capacity
                    .saturating_mul(dimension)
                    .saturating_sub(self.vectors.len()),
            )
            .map_err(|source| VectorError::CapacityGrowth {
                requested: new_capacity,
                source,
            })?;

        debug!(
            old_capacity = self.capacity,
            new_capacity,
            incoming,
            "Grew vector store"
        );
        self.capacity = new_capacity;
        self.reallocations += 1;
        Ok(())
    }

    /// Drop every pair at or after `len`. Capacity is kept.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        let dimension = self.dimension.unwrap_or(0);
        self.ids.truncate(len);
        self.vectors.truncate(len * dimension);
    }

    /// Identifier and vector stored at `position`
    pub fn get(&self, position: usize) -> Option<(ExternalId, &[f32])> {
        Some((self.id_at(position)?, self.vector(position)?))
    }

    /// Identifier stored at `position`
    pub fn id_at(&self, position: usize) -> Option<ExternalId> {
        self.ids.get(position).copied()
    }

    /// Vector stored at `position`
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let dimension = self.dimension?;
        let start = position.checked_mul(dimension)?;
        self.vectors.get(start..start.checked_add(dimension)?)
    }

    /// All stored identifiers, in position order
    pub fn ids(&self) -> &[ExternalId] {
        &self.ids
    }

    /// All stored vectors, row-major
    pub fn as_flat(&self) -> &[f32] {
        &self.vectors
    }

    /// Row-major vectors for a range of positions
    pub fn rows(&self, positions: Range<usize>) -> &[f32] {
        let dimension = self.dimension.unwrap_or(0);
        let end = (positions.end * dimension).min(self.vectors.len());
        let start = (positions.start * dimension).min(end);
        &self.vectors[start..end]
    }

    /// Iterate (identifier, vector) pairs in position order
    pub fn iter(&self) -> impl Iterator<Item = (ExternalId, &[f32])> + '_ {
        let dimension = self.dimension.unwrap_or(1);
        self.ids
            .iter()
            .copied()
            .zip(self.vectors.chunks_exact(dimension))
    }
}
