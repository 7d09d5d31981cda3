//! Thread-safe engine handle.
//!
//! Inserts take the write lock for the whole call, so buffer growth never
//! overlaps a query. Queries share the read lock.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::{IndexEngine, IndexStats, InsertStats, SearchHit};
use crate::error::VectorError;
use crate::persist::PersistedState;
use crate::store::ExternalId;

/// Cloneable, lock-protected `IndexEngine`.
#[derive(Debug, Clone)]
pub struct SharedIndexEngine {
    inner: Arc<RwLock<IndexEngine>>,
}

impl SharedIndexEngine {
    pub fn new(engine: IndexEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexEngine>, VectorError> {
        self.inner
            .read()
            .map_err(|e| VectorError::Lock(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexEngine>, VectorError> {
        self.inner
            .write()
            .map_err(|e| VectorError::Lock(format!("Failed to acquire write lock: {}", e)))
    }

    pub fn insert<V: AsRef<[f32]>>(
        &self,
        ids: &[ExternalId],
        vectors: &[V],
    ) -> Result<InsertStats, VectorError> {
        self.write()?.insert(ids, vectors)
    }

    pub fn insert_stream<I, V>(&self, pairs: I) -> Result<InsertStats, VectorError>
    where
        I: IntoIterator<Item = (ExternalId, V)>,
        V: AsRef<[f32]>,
    {
        self.write()?.insert_stream(pairs)
    }

    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorError> {
        self.read()?.query(vector, k)
    }

    pub fn query_batch<V: AsRef<[f32]>>(
        &self,
        queries: &[V],
        k: usize,
    ) -> Result<Vec<Vec<SearchHit>>, VectorError> {
        self.read()?.query_batch(queries, k)
    }

    pub fn len(&self) -> Result<usize, VectorError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, VectorError> {
        Ok(self.read()?.is_empty())
    }

    pub fn stats(&self) -> Result<IndexStats, VectorError> {
        Ok(self.read()?.stats())
    }

    pub fn snapshot(&self) -> Result<PersistedState, VectorError> {
        Ok(self.read()?.snapshot())
    }

    /// Swap in an engine rebuilt from `state`, keeping the current config
    /// and backend.
    pub fn restore(&self, state: &PersistedState) -> Result<(), VectorError> {
        let (config, builder) = {
            let engine = self.read()?;
            (engine.config().clone(), engine.builder())
        };
        let rebuilt = IndexEngine::restore_with_backend(state, config, builder)?;
        *self.write()? = rebuilt;
        Ok(())
    }
}

impl From<IndexEngine> for SharedIndexEngine {
    fn from(engine: IndexEngine) -> Self {
        Self::new(engine)
    }
}
