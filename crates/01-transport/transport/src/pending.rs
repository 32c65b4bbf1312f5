//! Multi-producer buffer handed over to a single consumer in whole batches.
//!
//! Producers append under a short lock; the consumer swaps the entire buffer
//! out in one critical section. Each item therefore lands in exactly one batch,
//! and items from one producer keep their push order.

use parking_lot::Mutex;
use std::mem;

/// Append-only queue drained as a batch.
#[derive(Debug)]
pub struct PendingQueue<T> {
    inner: Mutex<Vec<T>>,
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty queue with room for `capacity` items before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Appends `item` behind everything pushed so far.
    pub fn push(&self, item: T) {
        self.inner.lock().push(item);
    }

    /// Takes every queued item, leaving the queue empty.
    pub fn take_batch(&self) -> Vec<T> {
        let mut guard = self.inner.lock();
        let capacity = guard.capacity();
        mem::replace(&mut *guard, Vec::with_capacity(capacity))
    }

    /// Number of items waiting for the next batch.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
