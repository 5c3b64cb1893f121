//! In-memory batch sink.

use std::sync::{Arc, Mutex, MutexGuard};

use arrow::array::RecordBatch;

use super::{BackendError, BatchSink};

/// Collects batches in a shared list.
///
/// Clones share the same list, so a caller can keep one handle and give the
/// other to a writer.
#[derive(Debug, Clone, Default)]
pub struct MemoryBatchSink {
    batches: Arc<Mutex<Vec<RecordBatch>>>,
    finished: Arc<Mutex<bool>>,
}

impl MemoryBatchSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The batches received so far.
    pub fn batches(&self) -> Vec<RecordBatch> {
        lock(&self.batches).clone()
    }

    pub fn total_rows(&self) -> usize {
        lock(&self.batches).iter().map(RecordBatch::num_rows).sum()
    }

    /// Whether `finish` has been called on any handle.
    pub fn is_finished(&self) -> bool {
        *lock(&self.finished)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl BatchSink for MemoryBatchSink {
    fn write_batch(&mut self, batch: RecordBatch) -> Result<(), BackendError> {
        lock(&self.batches).push(batch);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), BackendError> {
        *lock(&self.finished) = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, UInt8Array};

    #[test]
    fn test_handles_share_batches() {
        let handle = MemoryBatchSink::new();
        let mut sink: Box<dyn BatchSink> = Box::new(handle.clone());

        let column: ArrayRef = Arc::new(UInt8Array::from(vec![1, 2, 3]));
        let batch = RecordBatch::try_from_iter(vec![("n", column)]).unwrap();
        sink.write_batch(batch).unwrap();
        assert!(!handle.is_finished());
        sink.finish().unwrap();

        assert_eq!(handle.batches().len(), 1);
        assert_eq!(handle.total_rows(), 3);
        assert!(handle.is_finished());
    }
}
