//! Bounded FIFO of slot indices.
//!
//! The ring stores the position of the oldest entry plus a length, so no
//! counter ever wraps and capacities need not be powers of two.

/// Result of pushing a slot index into a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotPush {
    /// The index was enqueued successfully.
    Ok,
    /// The ring is full; callers should treat this as backpressure.
    WouldBlock,
}

/// Result of popping a slot index from a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotPop {
    /// Returned the next queued slot index.
    Ok {
        /// Index of the dequeued slot.
        slot_idx: u32,
    },
    /// No indices are queued at the moment.
    Empty,
}

/// Fixed-capacity ring of `u32` slot indices.
#[derive(Debug, Clone)]
pub struct IndexRing {
    entries: Box<[u32]>,
    front: u32,
    len: u32,
}

impl IndexRing {
    /// Creates an empty ring able to hold `capacity` indices.
    pub fn new(capacity: u32) -> Self {
        Self {
            entries: vec![0; capacity as usize].into_boxed_slice(),
            front: 0,
            len: 0,
        }
    }

    /// Creates a ring pre-filled with `0..capacity` in ascending order.
    pub fn filled(capacity: u32) -> Self {
        let mut ring = Self::new(capacity);
        for (i, entry) in ring.entries.iter_mut().enumerate() {
            *entry = i as u32;
        }
        ring.len = capacity;
        ring
    }

    /// Maximum number of indices the ring can hold.
    pub fn capacity(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Number of indices currently queued.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns `true` when no indices are queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Enqueues `value` at the back of the ring.
    pub fn push(&mut self, value: u32) -> SlotPush {
        let capacity = self.capacity();
        if self.len >= capacity {
            return SlotPush::WouldBlock;
        }
        let index = ((self.front + self.len) % capacity) as usize;
        self.entries[index] = value;
        self.len += 1;
        SlotPush::Ok
    }

    /// Dequeues the index at the front of the ring.
    pub fn pop(&mut self) -> SlotPop {
        if self.is_empty() {
            return SlotPop::Empty;
        }
        let slot_idx = self.entries[self.front as usize];
        self.front = (self.front + 1) % self.capacity();
        self.len -= 1;
        SlotPop::Ok { slot_idx }
    }
}
