//! Ownership hand-off primitives shared by the frame and input services.
//!
//! Nothing in here knows about eyes, poses, or hands. The crate exposes:
//! * [`IndexRing`] – bounded FIFO of slot indices, used as a free list.
//! * [`SlotPool`] – fixed set of typed slots moving through `Free → Writing → Published → Free`.
//! * [`PendingQueue`] – multi-producer buffer drained as a whole batch by one consumer.
//! * [`Mailbox`] – single-value, coalescing latest-wins cell.
//! * [`TransportError`] – lightweight error surface for configuration and slot misuse.

mod error;
mod index_ring;
mod mailbox;
mod pending;
mod slot_pool;

pub use error::{TransportError, TransportResult};
pub use index_ring::{IndexRing, SlotPop, SlotPush};
pub use mailbox::{Mailbox, MailboxSend};
pub use pending::PendingQueue;
pub use slot_pool::{SlotLease, SlotPool, SlotPoolConfig, SlotState, MAX_SLOT_COUNT};
