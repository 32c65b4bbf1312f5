//! Health tracking for dropped frames and recovery.
//!
//! A dropped frame opens a short countdown window during which the render
//! collaborator is expected to shed best-effort work until frames flow again.
//! The window decays one step per successful frame.

use xr_uniforms::SyncError;

/// Latch-style indicators for the compositor and UI.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HealthFlags {
    /// Set while frames are being dropped; cleared by the next presented frame.
    pub render_stalled: bool,
    /// A handle or configuration error that retrying cannot fix.
    pub fatal: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameHealth {
    pub flags: HealthFlags,
    /// Remaining frames of the current relief window.
    pub stall_relief_frames: u8,
    pub dropped_frames: u64,
}

impl FrameHealth {
    /// Starts or extends a relief window and marks rendering as stalled.
    pub fn begin_stall_relief(&mut self, frames: u8) {
        self.flags.render_stalled = true;
        if frames > self.stall_relief_frames {
            self.stall_relief_frames = frames;
        }
    }

    pub fn decay_one_frame(&mut self) {
        self.stall_relief_frames = self.stall_relief_frames.saturating_sub(1);
    }

    /// Clears the stall flag after a presented frame and decays relief.
    pub fn clear_on_success(&mut self) {
        self.flags.render_stalled = false;
        self.decay_one_frame();
    }

    pub fn record_drop(&mut self, error: &SyncError, relief_frames: u8) {
        self.dropped_frames += 1;
        if matches!(
            error,
            SyncError::InvalidHandle { .. } | SyncError::InvalidConfig(_)
        ) {
            self.flags.fatal = true;
        }
        self.begin_stall_relief(relief_frames);
    }

    pub fn in_relief(&self) -> bool {
        self.stall_relief_frames > 0
    }
}
