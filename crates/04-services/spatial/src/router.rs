//! The router proper: validation on ingest, one swap per cycle on dispatch.
//!
//! Lock order is cycle, then table, then pending. Producers only ever take the
//! table lock (and pending under it), so they never wait on delivery.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use log::{debug, trace, warn};
use parking_lot::Mutex;
use smallvec::SmallVec;
use transport::PendingQueue;
use xr_abi::{HandAnchors, SpatialBatch, SpatialEvent};

use crate::anchors::{HandAnchorMailbox, PostOutcome};
use crate::consumer::{ConsumerId, Delivery, DeliveryTarget, FnConsumer, SpatialConsumer};
use crate::diagnostics::{DiagnosticsLog, RouterDiagnostic, DEFAULT_DIAGNOSTICS_CAPACITY};
use crate::interaction::{Interaction, InteractionTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouterConfig {
    /// Diagnostics kept before the oldest are discarded.
    pub diagnostics_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            diagnostics_capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Queued for the next dispatch cycle.
    Accepted,
    /// Terminal phase for an untracked id; dropped and recorded as a diagnostic.
    Orphaned,
}

/// Summary of one dispatch cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub cycle: u64,
    /// Events drained from the pending queue this cycle.
    pub delivered_events: usize,
    /// Consumers that received the batch.
    pub consumers: usize,
    /// Channel consumers dropped because their receiver is gone.
    pub disconnected: usize,
}

/// Lifetime counters; `cycles` counts dispatches that took a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub accepted: u64,
    pub orphaned: u64,
    pub cycles: u64,
    pub dispatched_events: u64,
    pub diagnostics_evicted: u64,
}

struct IngestShared {
    table: Mutex<InteractionTable>,
    pending: PendingQueue<SpatialEvent>,
    diagnostics: Mutex<DiagnosticsLog>,
    anchors: HandAnchorMailbox,
    /// Last cycle whose batch was taken; written under the table lock.
    taken_cycle: AtomicU64,
    accepted: AtomicU64,
    orphaned: AtomicU64,
}

impl IngestShared {
    fn ingest(&self, event: SpatialEvent) -> IngestOutcome {
        // Queue while the table is held so pending order matches validation order.
        let mut table = self.table.lock();
        let cycle = self.taken_cycle.load(Ordering::Relaxed) + 1;
        let transition = table.apply(&event, cycle);
        if transition.is_accepted() {
            self.pending.push(event);
            drop(table);
            self.accepted.fetch_add(1, Ordering::Relaxed);
            trace!("ingest id={} {:?} -> {:?}", event.id, event.phase, transition);
            return IngestOutcome::Accepted;
        }
        drop(table);

        warn!(
            "dropping orphan {:?} for untracked interaction {} ({:?})",
            event.phase, event.id, event.chirality
        );
        self.diagnostics.lock().record(RouterDiagnostic::OrphanEvent {
            id: event.id,
            chirality: event.chirality,
            phase: event.phase,
        });
        self.orphaned.fetch_add(1, Ordering::Relaxed);
        IngestOutcome::Orphaned
    }
}

/// Producer-side handle for tracking threads.
#[derive(Clone)]
pub struct IngestHandle {
    shared: Arc<IngestShared>,
}

impl IngestHandle {
    /// Same as [`SpatialEventRouter::ingest`].
    pub fn ingest(&self, event: SpatialEvent) -> IngestOutcome {
        self.shared.ingest(event)
    }

    /// Replaces the latest hand anchors; unread anchors are coalesced.
    pub fn post_hands(&self, anchors: HandAnchors) -> PostOutcome {
        self.shared.anchors.post(anchors)
    }
}

impl fmt::Debug for IngestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestHandle")
            .field("pending", &self.shared.pending.len())
            .finish()
    }
}

type ConsumerEntry = (ConsumerId, Arc<Mutex<DeliveryTarget>>);

/// Validates spatial samples on ingestion and fans them out once per cycle.
pub struct SpatialEventRouter {
    shared: Arc<IngestShared>,
    consumers: Mutex<Vec<ConsumerEntry>>,
    next_consumer: AtomicU64,
    /// Held for the whole dispatch so cycles never interleave.
    cycle: Mutex<u64>,
    dispatched_events: AtomicU64,
}

impl Default for SpatialEventRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl SpatialEventRouter {
    /// Empty router: no consumers, no open interactions, cycle 0.
    pub fn new(config: RouterConfig) -> Self {
        Self {
            shared: Arc::new(IngestShared {
                table: Mutex::new(InteractionTable::default()),
                pending: PendingQueue::with_capacity(64),
                diagnostics: Mutex::new(DiagnosticsLog::with_capacity(
                    config.diagnostics_capacity,
                )),
                anchors: HandAnchorMailbox::new(),
                taken_cycle: AtomicU64::new(0),
                accepted: AtomicU64::new(0),
                orphaned: AtomicU64::new(0),
            }),
            consumers: Mutex::new(Vec::new()),
            next_consumer: AtomicU64::new(1),
            cycle: Mutex::new(0),
            dispatched_events: AtomicU64::new(0),
        }
    }

    /// Cloneable handle for producer threads. It keeps the ingest side alive
    /// even if the router is dropped first.
    pub fn ingest_handle(&self) -> IngestHandle {
        IngestHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Validates `event` against the open interactions and queues it for the
    /// next dispatch.
    ///
    /// `Active` opens or updates an interaction. `Cancelled`/`Ended` close one,
    /// or are dropped as orphans (logged and kept in [`Self::diagnostics`]) when
    /// the id is not tracked. Safe from any thread.
    pub fn ingest(&self, event: SpatialEvent) -> IngestOutcome {
        self.shared.ingest(event)
    }

    /// Latest hand anchors posted by the tracking source.
    pub fn anchors(&self) -> &HandAnchorMailbox {
        &self.shared.anchors
    }

    /// Delivers everything queued since the previous cycle to every consumer.
    ///
    /// Consumers are snapshotted first and invoked without the registry lock,
    /// so registrations made during delivery take effect next cycle. Empty
    /// cycles still advance the cycle counter but deliver nothing.
    ///
    /// A call made while another cycle is delivering (from a consumer, or a
    /// second thread) does not wait: it returns an empty report for the cycle
    /// in progress and leaves queued events for the next dispatch.
    pub fn dispatch(&self) -> DispatchReport {
        let Some(mut cycle) = self.cycle.try_lock() else {
            let current = self.shared.taken_cycle.load(Ordering::Relaxed);
            warn!("dispatch requested while cycle {current} is delivering; skipped");
            return DispatchReport {
                cycle: current,
                ..DispatchReport::default()
            };
        };
        *cycle += 1;

        let events = {
            // Swap under the table lock so every queued sample knows its cycle.
            let _table = self.shared.table.lock();
            self.shared.taken_cycle.store(*cycle, Ordering::Relaxed);
            self.shared.pending.take_batch()
        };
        let mut report = DispatchReport {
            cycle: *cycle,
            delivered_events: events.len(),
            ..DispatchReport::default()
        };
        if events.is_empty() {
            trace!("dispatch cycle {}: idle", report.cycle);
            return report;
        }
        self.dispatched_events
            .fetch_add(events.len() as u64, Ordering::Relaxed);

        let batch: SpatialBatch = events.into();
        let targets: SmallVec<[ConsumerEntry; 4]> =
            self.consumers.lock().iter().cloned().collect();
        if targets.is_empty() {
            debug!(
                "dispatch cycle {}: {} events with no consumers",
                report.cycle,
                batch.len()
            );
        }

        let mut gone: SmallVec<[ConsumerId; 2]> = SmallVec::new();
        for (id, target) in &targets {
            match target.lock().deliver(&batch) {
                Delivery::Delivered => report.consumers += 1,
                Delivery::Disconnected => gone.push(*id),
            }
        }
        if !gone.is_empty() {
            self.consumers.lock().retain(|(id, _)| !gone.contains(id));
            for id in &gone {
                debug!("{id} disconnected; unregistered");
            }
            report.disconnected = gone.len();
        }

        trace!(
            "dispatch cycle {}: {} events to {} consumers",
            report.cycle,
            report.delivered_events,
            report.consumers
        );
        report
    }

    /// Adds a callback consumer. It sees every batch dispatched after this
    /// returns.
    pub fn register_consumer(&self, consumer: Box<dyn SpatialConsumer>) -> ConsumerId {
        self.register(DeliveryTarget::Callback(consumer))
    }

    /// Closure form of [`Self::register_consumer`].
    pub fn register_fn<F>(&self, f: F) -> ConsumerId
    where
        F: FnMut(&[SpatialEvent]) + Send + 'static,
    {
        self.register_consumer(Box::new(FnConsumer(f)))
    }

    /// Registers an unbounded channel; dropping the receiver unregisters it on
    /// the next non-empty dispatch.
    pub fn register_channel(&self) -> (ConsumerId, Receiver<SpatialBatch>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (self.register(DeliveryTarget::Channel(tx)), rx)
    }

    /// Removes a consumer; returns `false` if `id` was not registered. A cycle
    /// already delivering may still reach it once.
    pub fn unregister_consumer(&self, id: ConsumerId) -> bool {
        let mut consumers = self.consumers.lock();
        let before = consumers.len();
        consumers.retain(|(existing, _)| *existing != id);
        let removed = consumers.len() != before;
        if removed {
            debug!("{id} unregistered");
        }
        removed
    }

    /// Currently registered consumers.
    pub fn consumer_count(&self) -> usize {
        self.consumers.lock().len()
    }

    /// Retained orphan diagnostics, oldest first.
    pub fn diagnostics(&self) -> Vec<RouterDiagnostic> {
        self.shared.diagnostics.lock().snapshot()
    }

    /// Drains the retained diagnostics.
    pub fn take_diagnostics(&self) -> Vec<RouterDiagnostic> {
        self.shared.diagnostics.lock().take()
    }

    /// Ids with an open interaction, ascending.
    pub fn tracked_ids(&self) -> Vec<i32> {
        self.shared.table.lock().ids()
    }

    /// Snapshot of the open interaction for `id`, if any.
    pub fn interaction(&self, id: i32) -> Option<Interaction> {
        self.shared.table.lock().get(id).copied()
    }

    /// Accepted events waiting for the next dispatch.
    pub fn pending_len(&self) -> usize {
        self.shared.pending.len()
    }

    /// Counters since construction; safe to call from inside a consumer.
    pub fn stats(&self) -> RouterStats {
        RouterStats {
            accepted: self.shared.accepted.load(Ordering::Relaxed),
            orphaned: self.shared.orphaned.load(Ordering::Relaxed),
            cycles: self.shared.taken_cycle.load(Ordering::Relaxed),
            dispatched_events: self.dispatched_events.load(Ordering::Relaxed),
            diagnostics_evicted: self.shared.diagnostics.lock().evicted(),
        }
    }

    /// Forgets queued events, open interactions and unread hand anchors.
    /// Returns the number of queued events dropped.
    ///
    /// For when the input session ends; consumers stay registered and the
    /// cycle counter keeps counting.
    pub fn reset(&self) -> usize {
        let dropped = {
            let mut table = self.shared.table.lock();
            table.clear();
            self.shared.pending.take_batch().len()
        };
        let anchors = self.shared.anchors.take_latest().is_some();
        debug!("router reset: {dropped} queued events dropped, anchors pending={anchors}");
        dropped
    }

    fn register(&self, target: DeliveryTarget) -> ConsumerId {
        let id = ConsumerId(self.next_consumer.fetch_add(1, Ordering::Relaxed));
        debug!("{id} registered ({target:?})");
        self.consumers
            .lock()
            .push((id, Arc::new(Mutex::new(target))));
        id
    }
}

impl fmt::Debug for SpatialEventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialEventRouter")
            .field("consumers", &self.consumer_count())
            .field("pending", &self.pending_len())
            .field("tracked", &self.tracked_ids())
            .finish()
    }
}
