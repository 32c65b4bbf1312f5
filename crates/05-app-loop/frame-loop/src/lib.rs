//! Per-frame orchestration of spatial dispatch and stereo uniform composition.
//!
//! Each compositor frame walks `Idle -> TrackingReady -> FrameActive ->
//! Published -> Idle`. Spatial events are dispatched before transforms are
//! computed so consumers see the input that the frame renders.

mod collaborator;
mod config;
mod error;
mod frame_loop;
mod health;

pub use collaborator::{FrameInputs, PresentStatus, RenderCollaborator, TrackingSample};
pub use config::{ConfigError, FrameLoopConfig, DEFAULT_STALL_RELIEF_FRAMES};
pub use error::{LoopError, LoopResult};
pub use frame_loop::{FrameLoop, FrameOutcome, FramePhase};
pub use health::{FrameHealth, HealthFlags};
