//! ANN index trait and types.
//!
//! Defines the interface the engine needs from an approximate nearest
//! neighbor backend. Backends address vectors by dense internal position:
//! the n-th vector ever added has position n.

use crate::error::VectorError;

/// One neighbor returned by an ANN backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Internal dense position of the vector
    pub position: usize,
    /// Distance under the backend's metric (lower = closer)
    pub distance: f32,
}

impl Neighbor {
    pub fn new(position: usize, distance: f32) -> Self {
        Self { position, distance }
    }
}

/// Trait for ANN backends.
///
/// Implementations must be thread-safe for concurrent read access.
pub trait AnnIndex: Send + Sync {
    /// Get the vector dimension
    fn dimension(&self) -> usize;

    /// Get the number of vectors in the index
    fn len(&self) -> usize;

    /// Check if the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make room for at least `capacity` vectors in total.
    fn reserve(&mut self, _capacity: usize) -> Result<(), VectorError> {
        Ok(())
    }

    /// Add row-major vectors. They take positions `len()..len() + rows`.
    fn add(&mut self, vectors: &[f32]) -> Result<(), VectorError>;

    /// Search for up to k nearest neighbors, closest first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError>;

    /// Short backend name for logs and stats
    fn name(&self) -> &'static str;
}

/// Constructs an ANN backend once the dimension is known.
pub trait AnnBuilder: Send + Sync {
    fn build(&self, dimension: usize) -> Result<Box<dyn AnnIndex>, VectorError>;
}
