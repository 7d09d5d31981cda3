//! # semindex-vector
//!
//! Append-only vector index engine for semantic search.
//!
//! Callers stream in `(identifier, vector)` pairs produced by an encoder and
//! query for the top-k nearest stored vectors. Raw vectors live in a
//! growable store; nearest-neighbor search runs on an HNSW graph (usearch)
//! keyed by dense insertion position.
//!
//! ## Features
//! - Batched insertion with all-or-nothing validation
//! - Amortized store growth (over-allocation by a multiple of the batch)
//! - Pluggable ANN backend behind `AnnIndex` / `AnnBuilder`
//! - Snapshots without the graph; restore replays the stored pairs
//! - `SharedIndexEngine` for single-writer, multi-reader use
//!
//! ## Example
//!
//! ```no_run
//! use semindex_vector::{EngineConfig, IndexEngine};
//!
//! let mut engine = IndexEngine::new(EngineConfig::default());
//! let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
//! engine.insert(&[10, 20], &vectors)?;
//!
//! let hits = engine.query(&[0.0, 1.0], 1)?;
//! assert_eq!(hits[0].id, 20);
//! # Ok::<(), semindex_vector::VectorError>(())
//! ```

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod hnsw;
pub mod index;
pub mod persist;
pub mod shared;
pub mod store;

pub use batch::{BatchSplitter, DEFAULT_BATCH_SIZE};
pub use config::EngineConfig;
pub use engine::{EngineState, IndexEngine, IndexStats, InsertStats, SearchHit};
pub use error::VectorError;
pub use hnsw::{HnswConfig, HnswIndex, DEFAULT_EF};
pub use index::{AnnBuilder, AnnIndex, Neighbor};
pub use persist::{PersistedState, SNAPSHOT_FORMAT_VERSION};
pub use semindex_types::DistanceMetric;
pub use shared::SharedIndexEngine;
pub use store::{ExternalId, GrowthPolicy, VectorStore, DEFAULT_GROWTH_FACTOR};
