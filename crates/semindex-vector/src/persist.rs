//! Snapshot and restore.
//!
//! A snapshot holds the stored identifiers and raw vectors only. The ANN
//! structure is never written out; restore rebuilds it by replaying the
//! stored pairs through the normal insert path.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EngineConfig;
use crate::engine::IndexEngine;
use crate::error::VectorError;
use crate::index::AnnBuilder;
use crate::store::ExternalId;

/// Current snapshot layout version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Persisted engine state, without the ANN structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Layout version of this bundle
    pub format_version: u32,
    /// Latched dimension
    #[serde(default)]
    pub dimension: Option<usize>,
    /// Number of stored pairs
    #[serde(default)]
    pub count: usize,
    /// Store capacity at snapshot time. Informational only, restore regrows.
    #[serde(default)]
    pub capacity: usize,
    /// Identifiers in position order
    #[serde(default)]
    pub ids: Vec<ExternalId>,
    /// Vectors in position order, row-major
    #[serde(default)]
    pub vectors: Vec<f32>,
}

impl PersistedState {
    /// Check internal consistency of the bundle.
    pub fn validate(&self) -> Result<(), VectorError> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(VectorError::InvalidSnapshot(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }
        if self.ids.len() != self.count {
            return Err(VectorError::InvalidSnapshot(format!(
                "count is {} but {} ids are present",
                self.count,
                self.ids.len()
            )));
        }
        match self.dimension {
            Some(0) => Err(VectorError::InvalidSnapshot(
                "dimension must be non-zero".to_string(),
            )),
            Some(dimension) if self.vectors.len() != self.count * dimension => {
                Err(VectorError::InvalidSnapshot(format!(
                    "{} floats for {} vectors of dimension {}",
                    self.vectors.len(),
                    self.count,
                    dimension
                )))
            }
            None if self.count > 0 || !self.vectors.is_empty() => Err(
                VectorError::InvalidSnapshot("vectors present without a dimension".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Serialize to the opaque in-memory bundle.
    pub fn to_bytes(&self) -> Result<Vec<u8>, VectorError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize and validate a bundle produced by `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VectorError> {
        let state: PersistedState = serde_json::from_slice(bytes)?;
        state.validate()?;
        Ok(state)
    }

    /// Write the bundle to `path`, replacing it atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), VectorError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = temp_path_for(path);
        {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp_path, path)?;

        info!(path = ?path, count = self.count, "Saved index snapshot");
        Ok(())
    }

    /// Read and validate a bundle written by `save`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VectorError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let state: PersistedState = serde_json::from_reader(reader)?;
        state.validate()?;

        info!(path = ?path, count = state.count, "Loaded index snapshot");
        Ok(state)
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl IndexEngine {
    /// Capture the stored pairs. The ANN structure is left out.
    pub fn snapshot(&self) -> PersistedState {
        let store = self.store();
        PersistedState {
            format_version: SNAPSHOT_FORMAT_VERSION,
            dimension: store.dimension(),
            count: store.len(),
            capacity: store.capacity(),
            ids: store.ids().to_vec(),
            vectors: store.as_flat().to_vec(),
        }
    }

    /// Rebuild an engine from a snapshot using the default HNSW backend.
    pub fn restore(state: &PersistedState, config: EngineConfig) -> Result<Self, VectorError> {
        let builder = Arc::new(config.hnsw.clone());
        Self::restore_with_backend(state, config, builder)
    }

    /// Rebuild an engine from a snapshot with a custom ANN backend.
    ///
    /// Stored pairs are replayed through `insert`, so the store and the ANN
    /// structure regrow from scratch with the configured batching.
    pub fn restore_with_backend(
        state: &PersistedState,
        config: EngineConfig,
        builder: Arc<dyn AnnBuilder>,
    ) -> Result<Self, VectorError> {
        state.validate()?;

        let mut engine = IndexEngine::with_backend(config, builder);
        let Some(dimension) = state.dimension else {
            info!("Restored empty index");
            return Ok(engine);
        };
        if state.count == 0 {
            info!("Restored empty index");
            return Ok(engine);
        }

        let rows: Vec<&[f32]> = state.vectors.chunks_exact(dimension).collect();
        let stats = engine.insert(&state.ids, &rows)?;

        info!(
            count = stats.inserted,
            batches = stats.batches,
            dim = dimension,
            "Restored index from snapshot"
        );
        Ok(engine)
    }

    /// Snapshot, then restore into a fresh engine with the same backend.
    pub fn rebuild(&self) -> Result<Self, VectorError> {
        Self::restore_with_backend(&self.snapshot(), self.config().clone(), self.builder())
    }
}
