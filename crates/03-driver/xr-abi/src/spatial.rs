//! Hand and controller samples delivered by the tracking source.

use glam::DMat4;
use std::sync::Arc;

/// Which hand produced a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Chirality {
    Left,
    Right,
}

/// Lifecycle phase of one sample within an interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpatialPhase {
    /// Interaction is ongoing; carries the current pose.
    Active,
    /// Interaction was aborted by the system.
    Cancelled,
    /// Interaction finished normally.
    Ended,
}

impl SpatialPhase {
    /// `Cancelled` and `Ended` close an interaction.
    pub fn is_terminal(self) -> bool {
        matches!(self, SpatialPhase::Cancelled | SpatialPhase::Ended)
    }
}

/// One hand/controller sample.
///
/// `id` stays stable from the first `Active` sample through exactly one
/// terminal sample; afterwards it may be reused for an unrelated interaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialEvent {
    pub id: i32,
    pub chirality: Chirality,
    pub phase: SpatialPhase,
    /// Input device pose in world space.
    pub pose: DMat4,
}

impl SpatialEvent {
    pub fn new(id: i32, chirality: Chirality, phase: SpatialPhase, pose: DMat4) -> Self {
        Self {
            id,
            chirality,
            phase,
            pose,
        }
    }

    pub fn active(id: i32, chirality: Chirality, pose: DMat4) -> Self {
        Self::new(id, chirality, SpatialPhase::Active, pose)
    }

    pub fn ended(id: i32, chirality: Chirality) -> Self {
        Self::new(id, chirality, SpatialPhase::Ended, DMat4::IDENTITY)
    }

    pub fn cancelled(id: i32, chirality: Chirality) -> Self {
        Self::new(id, chirality, SpatialPhase::Cancelled, DMat4::IDENTITY)
    }
}

/// Ordered events delivered to consumers in one dispatch cycle.
pub type SpatialBatch = Arc<[SpatialEvent]>;

/// Skeleton-free hand anchor as reported by hand tracking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandAnchor {
    pub chirality: Chirality,
    /// Whether the hand is currently tracked; the pose is stale otherwise.
    pub is_tracked: bool,
    pub origin_from_anchor: DMat4,
}

impl HandAnchor {
    pub fn tracked(chirality: Chirality, origin_from_anchor: DMat4) -> Self {
        Self {
            chirality,
            is_tracked: true,
            origin_from_anchor,
        }
    }

    pub fn untracked(chirality: Chirality) -> Self {
        Self {
            chirality,
            is_tracked: false,
            origin_from_anchor: DMat4::IDENTITY,
        }
    }
}

/// Left and right anchors sampled together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandAnchors {
    pub left: HandAnchor,
    pub right: HandAnchor,
}

impl HandAnchors {
    pub fn new(left: HandAnchor, right: HandAnchor) -> Self {
        Self { left, right }
    }
}
