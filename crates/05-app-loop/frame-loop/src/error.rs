use thiserror::Error;
use xr_uniforms::SyncError;

use crate::config::ConfigError;
use crate::frame_loop::FramePhase;

pub type LoopResult<T> = Result<T, LoopError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoopError {
    #[error("frame loop cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: FramePhase, to: FramePhase },

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
