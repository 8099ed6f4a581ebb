//! Media transport boundary.
//!
//! The decode/render engine is an external collaborator. Everything above it
//! sees only this trait plus a stream of [`TransportEvent`] notifications.
//! Commands return immediately; their completion arrives later on the
//! notification channel handed to [`crate::core::sync::TransportSync`].

use std::fmt;
use std::path::Path;

/// Transport playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "stopped"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

/// Single-frame step direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Forward,
    Backward,
}

/// Out-of-band notifications emitted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    StateChanged(PlaybackState),
    /// Seek completed; carries the position the transport actually landed on.
    SeekFinished(i64),
    StepFinished,
    PositionChanged(i64),
}

/// Error raised by a transport when a file cannot be opened.
#[derive(Debug, Clone)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport error: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// Asynchronous media transport.
///
/// Positions are milliseconds relative to the media start. `is_playing()`
/// follows the common player convention of being true for both playing and
/// paused sessions (i.e. "not stopped").
pub trait Transport {
    fn load(&mut self, path: &Path) -> Result<(), TransportError>;
    fn play(&mut self);
    /// `true` pauses, `false` resumes.
    fn pause(&mut self, paused: bool);
    fn stop(&mut self);
    fn seek(&mut self, position_ms: i64);
    fn step_forward(&mut self);
    fn step_backward(&mut self);
    fn set_filter_graph(&mut self, graph: &str);
    fn set_speed(&mut self, speed: f64);

    fn duration(&self) -> i64;
    fn start_position(&self) -> i64 {
        0
    }
    fn position(&self) -> i64;
    fn state(&self) -> PlaybackState;

    fn is_playing(&self) -> bool {
        self.state() != PlaybackState::Stopped
    }

    fn is_paused(&self) -> bool {
        self.state() == PlaybackState::Paused
    }

    fn step(&mut self, direction: StepDirection) {
        match direction {
            StepDirection::Forward => self.step_forward(),
            StepDirection::Backward => self.step_backward(),
        }
    }
}
