//! Vector engine error types.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur during vector operations.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Identifier and vector counts differ
    #[error("Length mismatch: {ids} ids for {vectors} vectors")]
    LengthMismatch { ids: usize, vectors: usize },

    /// Vector length differs from the established dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector element is NaN or infinite
    #[error("Invalid element at row {row}, column {column}: not a finite f32")]
    InvalidElement { row: usize, column: usize },

    /// Vectors must have at least one component
    #[error("Vectors must have a non-zero dimension")]
    ZeroDimension,

    /// Index queried before anything was inserted
    #[error("Index not initialized")]
    NotInitialized,

    /// Allocation failed while growing the store
    #[error("Failed to grow store to {requested} slots: {source}")]
    CapacityGrowth {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    /// ANN backend error
    #[error("Index error: {0}")]
    Index(String),

    /// Lock poisoned by a panicking writer
    #[error("Lock error: {0}")]
    Lock(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot contents are inconsistent
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl VectorError {
    /// Caller-side input errors. These never mutate the index and can be
    /// retried with corrected input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            VectorError::LengthMismatch { .. }
                | VectorError::DimensionMismatch { .. }
                | VectorError::InvalidElement { .. }
                | VectorError::ZeroDimension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(VectorError::LengthMismatch { ids: 1, vectors: 2 }.is_validation());
        assert!(VectorError::DimensionMismatch {
            expected: 4,
            actual: 3
        }
        .is_validation());
        assert!(VectorError::InvalidElement { row: 0, column: 1 }.is_validation());
        assert!(VectorError::ZeroDimension.is_validation());
        assert!(!VectorError::NotInitialized.is_validation());
        assert!(!VectorError::Index("boom".to_string()).is_validation());
    }

    #[test]
    fn test_display() {
        let err = VectorError::DimensionMismatch {
            expected: 128,
            actual: 64,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 128, got 64");
    }
}
