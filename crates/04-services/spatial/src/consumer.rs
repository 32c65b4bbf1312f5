use std::fmt;

use crossbeam_channel::Sender;
use xr_abi::{SpatialBatch, SpatialEvent};

/// Identifier handed out on registration; never reused by one router.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(pub(crate) u64);

impl ConsumerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consumer#{}", self.0)
    }
}

/// Receives one ordered batch per dispatch cycle.
///
/// Called on the thread running `dispatch`, outside the registry and table
/// locks, so a consumer may ingest, register or unregister from inside
/// `on_batch`. A nested `dispatch` returns an empty report instead of
/// delivering.
pub trait SpatialConsumer: Send {
    fn on_batch(&mut self, batch: &SpatialBatch);
}

/// Adapts a closure into a [`SpatialConsumer`].
pub struct FnConsumer<F>(pub F);

impl<F> SpatialConsumer for FnConsumer<F>
where
    F: FnMut(&[SpatialEvent]) + Send,
{
    fn on_batch(&mut self, batch: &SpatialBatch) {
        (self.0)(&batch[..])
    }
}

pub(crate) enum DeliveryTarget {
    Callback(Box<dyn SpatialConsumer>),
    Channel(Sender<SpatialBatch>),
}

pub(crate) enum Delivery {
    Delivered,
    Disconnected,
}

impl DeliveryTarget {
    pub(crate) fn deliver(&mut self, batch: &SpatialBatch) -> Delivery {
        match self {
            DeliveryTarget::Callback(consumer) => {
                consumer.on_batch(batch);
                Delivery::Delivered
            }
            DeliveryTarget::Channel(tx) => match tx.send(batch.clone()) {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Disconnected,
            },
        }
    }
}

impl fmt::Debug for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryTarget::Callback(_) => f.write_str("Callback"),
            DeliveryTarget::Channel(_) => f.write_str("Channel"),
        }
    }
}
