//! Fixed-size pools of typed slots with explicit ownership states.
//!
//! Every slot moves through `Free → Writing → Published → Free`. The free ring
//! hands out indices in FIFO order, and each acquisition stamps the slot with a
//! pool-wide generation so a lease held past recycling is detected instead of
//! silently touching the next occupant.

use crate::index_ring::{IndexRing, SlotPop, SlotPush};
use crate::{TransportError, TransportResult};

/// Upper bound on slots per pool.
pub const MAX_SLOT_COUNT: u32 = 64;

/// Ownership state of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Sitting in the free ring.
    Free,
    /// Exclusively held by the producer.
    Writing,
    /// Read-only; owned by the consumer until released.
    Published,
}

/// Configuration describing the shape of a slot pool.
#[derive(Clone, Copy, Debug)]
pub struct SlotPoolConfig {
    /// Number of slots managed by the pool.
    pub slot_count: u32,
}

/// Token proving a slot was acquired at a particular generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotLease {
    /// Index of the slot within the pool.
    pub idx: u32,
    /// Generation stamped at acquisition; unique across the pool.
    pub generation: u64,
}

#[derive(Debug)]
struct Slot<T> {
    state: SlotState,
    generation: u64,
    value: T,
}

/// Fixed-size pool of `T` slots with a free ring.
#[derive(Debug)]
pub struct SlotPool<T> {
    slots: Vec<Slot<T>>,
    free_ring: IndexRing,
    next_generation: u64,
}

impl<T: Default> SlotPool<T> {
    /// Allocates a pool whose slots start out as `T::default()`.
    ///
    /// All slots begin in the free ring, ready to be acquired via
    /// [`SlotPool::try_acquire`]. Callers recycle them by feeding leases
    /// through [`SlotPool::publish`] and [`SlotPool::release`], or
    /// [`SlotPool::abandon`] for work that is never published.
    pub fn new(config: SlotPoolConfig) -> TransportResult<Self> {
        validate_config(&config)?;
        let slots = (0..config.slot_count)
            .map(|_| Slot {
                state: SlotState::Free,
                generation: 0,
                value: T::default(),
            })
            .collect();
        Ok(Self {
            slots,
            free_ring: IndexRing::filled(config.slot_count),
            next_generation: 1,
        })
    }
}

impl<T> SlotPool<T> {
    /// Returns the number of slots managed by the pool.
    pub fn slot_count(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Returns the number of slots currently in the free ring.
    pub fn free_len(&self) -> u32 {
        self.free_ring.len()
    }

    /// Returns the number of slots held by a producer or consumer.
    pub fn in_use(&self) -> u32 {
        self.slot_count() - self.free_len()
    }

    /// Returns the state of slot `idx`, if it exists.
    pub fn state(&self, idx: u32) -> Option<SlotState> {
        self.slots.get(idx as usize).map(|slot| slot.state)
    }

    /// Pops the next free slot and moves it to [`SlotState::Writing`].
    ///
    /// Returns `None` when every slot is checked out.
    pub fn try_acquire(&mut self) -> Option<SlotLease> {
        let SlotPop::Ok { slot_idx } = self.free_ring.pop() else {
            return None;
        };
        let generation = self.next_generation;
        self.next_generation += 1;
        let slot = &mut self.slots[slot_idx as usize];
        debug_assert_eq!(slot.state, SlotState::Free, "free ring held a busy slot");
        slot.state = SlotState::Writing;
        slot.generation = generation;
        Some(SlotLease {
            idx: slot_idx,
            generation,
        })
    }

    /// Provides mutable access to a slot the lease holder is still writing.
    pub fn slot_mut(&mut self, lease: SlotLease) -> TransportResult<&mut T> {
        let slot = self.checked(lease, SlotState::Writing)?;
        Ok(&mut slot.value)
    }

    /// Freezes a written slot; it stays out of the free ring until released.
    pub fn publish(&mut self, lease: SlotLease) -> TransportResult<&T> {
        let slot = self.checked(lease, SlotState::Writing)?;
        slot.state = SlotState::Published;
        Ok(&slot.value)
    }

    /// Returns a published slot to the free ring.
    pub fn release(&mut self, lease: SlotLease) -> TransportResult<()> {
        self.checked(lease, SlotState::Published)?.state = SlotState::Free;
        self.push_free(lease.idx);
        Ok(())
    }

    /// Returns a slot that was acquired but never published to the free ring.
    pub fn abandon(&mut self, lease: SlotLease) -> TransportResult<()> {
        self.checked(lease, SlotState::Writing)?.state = SlotState::Free;
        self.push_free(lease.idx);
        Ok(())
    }

    fn push_free(&mut self, idx: u32) {
        if self.free_ring.push(idx) == SlotPush::WouldBlock {
            debug_assert!(false, "free ring overflowed – slot {idx} returned twice?");
        }
    }

    fn lookup(&self, lease: SlotLease) -> TransportResult<&Slot<T>> {
        let slot_count = self.slot_count();
        let slot = self
            .slots
            .get(lease.idx as usize)
            .ok_or(TransportError::SlotOutOfRange {
                idx: lease.idx,
                slot_count,
            })?;
        if slot.generation != lease.generation {
            return Err(TransportError::StaleLease {
                idx: lease.idx,
                lease: lease.generation,
                current: slot.generation,
            });
        }
        Ok(slot)
    }

    fn checked(&mut self, lease: SlotLease, expected: SlotState) -> TransportResult<&mut Slot<T>> {
        let state = self.lookup(lease)?.state;
        expect_state(lease.idx, state, expected)?;
        Ok(&mut self.slots[lease.idx as usize])
    }
}

fn expect_state(idx: u32, found: SlotState, expected: SlotState) -> TransportResult<()> {
    if found == expected {
        Ok(())
    } else {
        Err(TransportError::WrongState {
            idx,
            expected,
            found,
        })
    }
}

fn validate_config(config: &SlotPoolConfig) -> TransportResult<()> {
    if config.slot_count == 0 || config.slot_count > MAX_SLOT_COUNT {
        return Err(TransportError::InvalidCapacity {
            requested: config.slot_count as usize,
            minimum: 1,
            maximum: MAX_SLOT_COUNT as usize,
        });
    }
    Ok(())
}
