//! Spatial event routing between the tracking source and input consumers.
//!
//! Tracking callbacks may fire on any thread. They hand samples to the router
//! through [`IngestHandle::ingest`], which validates the interaction lifecycle
//! and queues accepted samples. The frame loop calls
//! [`SpatialEventRouter::dispatch`] once per frame to deliver everything queued
//! since the previous cycle, in ingestion order, to every registered consumer.

mod anchors;
mod consumer;
mod diagnostics;
mod interaction;
mod router;

pub use anchors::{HandAnchorMailbox, PostOutcome};
pub use consumer::{ConsumerId, FnConsumer, SpatialConsumer};
pub use diagnostics::{RouterDiagnostic, DEFAULT_DIAGNOSTICS_CAPACITY};
pub use interaction::Interaction;
pub use router::{
    DispatchReport, IngestHandle, IngestOutcome, RouterConfig, RouterStats, SpatialEventRouter,
};
