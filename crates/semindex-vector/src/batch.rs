//! Batch splitting for insertion requests.
//!
//! Large requests are committed in fixed-size chunks so a single growth
//! step and a single ANN add never see more than `batch_size` vectors.

use crate::store::ExternalId;

/// Default number of pairs per committed batch
pub const DEFAULT_BATCH_SIZE: usize = 2048;

/// Splits paired identifier/vector input into fixed-size batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSplitter {
    batch_size: usize,
}

impl Default for BatchSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchSplitter {
    /// A batch size of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches `len` pairs split into.
    pub fn batch_count(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size)
    }

    /// Split already length-checked slices into aligned batches.
    ///
    /// The last batch holds the remainder. Slices of different lengths are
    /// zipped to the shorter one, so callers validate lengths first.
    pub fn split<'a, V>(
        &self,
        ids: &'a [ExternalId],
        vectors: &'a [V],
    ) -> impl Iterator<Item = (&'a [ExternalId], &'a [V])> + 'a {
        ids.chunks(self.batch_size)
            .zip(vectors.chunks(self.batch_size))
    }

    /// Buffer an unbounded stream of pairs into owned batches.
    pub fn chunk_stream<I, V>(&self, pairs: I) -> StreamBatches<I::IntoIter>
    where
        I: IntoIterator<Item = (ExternalId, V)>,
    {
        StreamBatches {
            inner: pairs.into_iter(),
            batch_size: self.batch_size,
        }
    }
}

/// Iterator over owned batches drawn from a pair stream.
pub struct StreamBatches<I> {
    inner: I,
    batch_size: usize,
}

impl<I, V> Iterator for StreamBatches<I>
where
    I: Iterator<Item = (ExternalId, V)>,
{
    type Item = (Vec<ExternalId>, Vec<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let mut ids = Vec::with_capacity(self.batch_size);
        let mut vectors = Vec::with_capacity(self.batch_size);

        for (id, vector) in self.inner.by_ref().take(self.batch_size) {
            ids.push(id);
            vectors.push(vector);
        }

        if ids.is_empty() {
            None
        } else {
            Some((ids, vectors))
        }
    }
}
