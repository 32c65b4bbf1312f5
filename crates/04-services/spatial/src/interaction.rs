use std::collections::HashMap;

use log::debug;
use xr_abi::{Chirality, DMat4, SpatialEvent, SpatialPhase};

/// Live state of one tracked hand/controller identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interaction {
    pub id: i32,
    pub chirality: Chirality,
    /// Pose from the most recent `Active` sample.
    pub pose: DMat4,
    /// Number of `Active` samples seen, including the opening one.
    pub samples: u32,
    /// Dispatch cycle that delivers the opening sample.
    pub opened_at_cycle: u64,
}

/// How a sample relates to the tracked interactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    Opened,
    Updated,
    Closed,
    /// Terminal phase for an id that is not tracked.
    Orphan,
}

impl Transition {
    pub(crate) fn is_accepted(self) -> bool {
        self != Transition::Orphan
    }
}

#[derive(Debug, Default)]
pub(crate) struct InteractionTable {
    live: HashMap<i32, Interaction>,
}

impl InteractionTable {
    pub(crate) fn apply(&mut self, event: &SpatialEvent, cycle: u64) -> Transition {
        match event.phase {
            SpatialPhase::Active => match self.live.get_mut(&event.id) {
                Some(live) => {
                    if live.chirality != event.chirality {
                        debug!(
                            "interaction {} switched chirality {:?} -> {:?}",
                            event.id, live.chirality, event.chirality
                        );
                        live.chirality = event.chirality;
                    }
                    live.pose = event.pose;
                    live.samples = live.samples.saturating_add(1);
                    Transition::Updated
                }
                None => {
                    self.live.insert(
                        event.id,
                        Interaction {
                            id: event.id,
                            chirality: event.chirality,
                            pose: event.pose,
                            samples: 1,
                            opened_at_cycle: cycle,
                        },
                    );
                    debug!("interaction {} opened ({:?})", event.id, event.chirality);
                    Transition::Opened
                }
            },
            SpatialPhase::Cancelled | SpatialPhase::Ended => match self.live.remove(&event.id) {
                Some(_) => {
                    debug!("interaction {} closed ({:?})", event.id, event.phase);
                    Transition::Closed
                }
                None => Transition::Orphan,
            },
        }
    }

    pub(crate) fn get(&self, id: i32) -> Option<&Interaction> {
        self.live.get(&id)
    }

    pub(crate) fn clear(&mut self) {
        if !self.live.is_empty() {
            debug!("{} open interactions abandoned", self.live.len());
        }
        self.live.clear();
    }

    pub(crate) fn ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.live.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
