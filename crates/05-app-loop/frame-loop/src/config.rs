use serde::{Deserialize, Serialize};
use thiserror::Error;
use xr_spatial::{RouterConfig, DEFAULT_DIAGNOSTICS_CAPACITY};
use xr_uniforms::{SyncConfig, DEFAULT_RING_SIZE, MAX_RING_SIZE, MIN_RING_SIZE};

/// Frames best-effort work stays throttled after a dropped frame.
pub const DEFAULT_STALL_RELIEF_FRAMES: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("ring_size {ring_size} outside {min}..={max}")]
    RingSize { ring_size: u32, min: u32, max: u32 },
    #[error("diagnostics_capacity must be at least 1")]
    DiagnosticsCapacity,
}

/// Tunables for one frame loop; every field has a default so partial files load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameLoopConfig {
    pub ring_size: u32,
    pub stall_relief_frames: u8,
    pub diagnostics_capacity: usize,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            ring_size: DEFAULT_RING_SIZE,
            stall_relief_frames: DEFAULT_STALL_RELIEF_FRAMES,
            diagnostics_capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
        }
    }
}

impl FrameLoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RING_SIZE..=MAX_RING_SIZE).contains(&self.ring_size) {
            return Err(ConfigError::RingSize {
                ring_size: self.ring_size,
                min: MIN_RING_SIZE,
                max: MAX_RING_SIZE,
            });
        }
        if self.diagnostics_capacity == 0 {
            return Err(ConfigError::DiagnosticsCapacity);
        }
        Ok(())
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            ring_size: self.ring_size,
        }
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            diagnostics_capacity: self.diagnostics_capacity,
        }
    }
}
