use std::collections::VecDeque;

use xr_abi::{Chirality, SpatialPhase};

/// Default number of diagnostics retained before the oldest are discarded.
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 256;

/// Non-fatal condition recorded by the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouterDiagnostic {
    /// Terminal phase for an id with no open interaction; the event was dropped.
    OrphanEvent {
        id: i32,
        chirality: Chirality,
        phase: SpatialPhase,
    },
}

/// Bounded log; once full, recording evicts the oldest entry.
#[derive(Debug)]
pub(crate) struct DiagnosticsLog {
    entries: VecDeque<RouterDiagnostic>,
    capacity: usize,
    evicted: u64,
}

impl DiagnosticsLog {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_DIAGNOSTICS_CAPACITY)),
            capacity,
            evicted: 0,
        }
    }

    pub(crate) fn record(&mut self, diagnostic: RouterDiagnostic) {
        if self.capacity == 0 {
            self.evicted += 1;
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(diagnostic);
    }

    pub(crate) fn snapshot(&self) -> Vec<RouterDiagnostic> {
        self.entries.iter().copied().collect()
    }

    pub(crate) fn take(&mut self) -> Vec<RouterDiagnostic> {
        self.entries.drain(..).collect()
    }

    pub(crate) fn evicted(&self) -> u64 {
        self.evicted
    }
}
