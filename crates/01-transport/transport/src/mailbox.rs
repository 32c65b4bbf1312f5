//! Single-slot, coalescing mailbox.
//!
//! A mailbox stores the most recent value written by a producer. Subsequent
//! writes overwrite the previous value and report a `Coalesced` outcome while
//! remaining strictly non-blocking. The consumer always observes the latest
//! value and taking it resets the coalescing state.

use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Outcome reported when writing into the mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MailboxSend {
    /// Value replaced an empty slot or a previously taken value.
    Accepted,
    /// Value overwrote one that had not yet been taken.
    Coalesced,
}

/// Coalescing mailbox that retains only the newest value.
#[derive(Debug)]
pub struct Mailbox<T> {
    latest: ArcSwapOption<T>,
    coalesced: AtomicU64,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self {
            latest: ArcSwapOption::empty(),
            coalesced: AtomicU64::new(0),
        }
    }

    /// Stores `value` without blocking.
    ///
    /// Returns [`MailboxSend::Coalesced`] when the previous value is overwritten
    /// before the consumer took it.
    pub fn send(&self, value: T) -> MailboxSend {
        match self.latest.swap(Some(Arc::new(value))) {
            Some(_) => {
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                MailboxSend::Coalesced
            }
            None => MailboxSend::Accepted,
        }
    }

    /// Returns the latest value, clearing the coalescing window.
    pub fn take_latest(&self) -> Option<Arc<T>> {
        self.latest.swap(None)
    }

    /// Returns the latest value without consuming it.
    pub fn peek(&self) -> Option<Arc<T>> {
        self.latest.load_full()
    }

    /// Number of values overwritten before being taken.
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}
