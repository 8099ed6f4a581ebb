//! Player notifications published on the [`EventBus`](super::event_bus::EventBus).

use super::transport::PlaybackState;

// === Playback ===

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackStateChangedEvent(pub PlaybackState);

/// Playback reached the last frame and was paused automatically.
/// Distinct from a user pause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackEndedEvent {
    pub frame: usize,
}

// === Position ===

/// Frame/time labels changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameInfoChangedEvent {
    pub frame: usize,
    /// "Frame N" or "Frame N [I]"
    pub frame_label: String,
    /// "hh:mm:ss.zzz", empty when no timestamp is known
    pub time_label: String,
}

/// Comments/plot cursor should move to this frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorMovedEvent(pub usize);

// === Filters ===

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterGraphAppliedEvent {
    pub graph: String,
}
