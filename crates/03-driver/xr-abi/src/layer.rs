//! Lifecycle states reported by the compositor layer.

/// State of the compositor layer the frames are rendered into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerState {
    /// Layer accepts frames.
    Running,
    /// Layer is temporarily hidden; frames are not consumed.
    Paused,
    /// Layer is gone for good.
    Invalidated,
}

/// Visibility of the immersive space hosting the layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImmersiveSpaceState {
    #[default]
    Closed,
    InTransition,
    Open,
}

impl ImmersiveSpaceState {
    /// Space state implied by a layer state change.
    pub fn on_layer_state(self, layer: LayerState) -> Self {
        match layer {
            LayerState::Running => ImmersiveSpaceState::Open,
            LayerState::Paused => ImmersiveSpaceState::InTransition,
            LayerState::Invalidated => ImmersiveSpaceState::Closed,
        }
    }

    /// Space state after the user asks to open or dismiss the space.
    ///
    /// A request made mid-transition is ignored.
    pub fn on_toggle_request(self) -> Self {
        match self {
            ImmersiveSpaceState::Open | ImmersiveSpaceState::Closed => {
                ImmersiveSpaceState::InTransition
            }
            ImmersiveSpaceState::InTransition => ImmersiveSpaceState::InTransition,
        }
    }

    /// Frames are only produced while the space is open.
    pub fn accepts_frames(self) -> bool {
        self == ImmersiveSpaceState::Open
    }
}
