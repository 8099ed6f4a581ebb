//! Keeps the statistics frame position and the transport position in step.
//!
//! Two directions, one owner at a time:
//!
//! - **External -> transport**: the statistics views moved the current frame.
//!   If the transport is paused, seek a little before the target (to absorb
//!   keyframe snapping) and single-step forward until the target time is
//!   reached. Frame-exact regardless of seek granularity.
//! - **Transport -> external**: the transport reported a new position. Map it
//!   to a frame and write it into the frame model.
//!
//! Re-entrancy is handled by an explicit state machine instead of guard flags:
//! while `Reconciling(_)`, notifications from the other side are dropped. In
//! particular the frame model's change notification caused by our own write
//! never turns into a seek.

use log::{debug, trace, warn};
use std::time::Duration;

use super::event_bus::EventBus;
use super::frame_model::FrameModel;
use super::mapper::FrameTimeMapper;
use super::player_events::{CursorMovedEvent, FrameInfoChangedEvent, PlaybackEndedEvent};
use super::sync::{SyncError, TransportSync};
use super::transport::{PlaybackState, StepDirection, Transport};
use crate::timecode::format_time_ms;

/// Frames to seek before the target so the forward-step loop starts from a
/// decoded frame rather than a snapped keyframe past it.
pub const DEFAULT_SEEK_BACK_FRAMES: usize = 12;

/// Consecutive steps without progress before the landing loop gives up.
const MAX_STALLED_STEPS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    ExternalToTransport,
    TransportToExternal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileState {
    #[default]
    Idle,
    Reconciling(SyncDirection),
}

/// What a notification led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dropped: another reconciliation owns the position, or input is held.
    Ignored,
    /// Both sides already agree (or nothing can be mapped).
    Unchanged,
    Applied,
}

/// Slider state as far as reconciliation cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionSlider {
    pub value: i64,
    pub maximum: i64,
    pub dragging: bool,
}

#[derive(Debug)]
pub struct PositionReconciler {
    state: ReconcileState,
    mapper: Option<FrameTimeMapper>,
    slider: PositionSlider,
    seek_back_frames: usize,
    step_timeout: Duration,
    dropped_echoes: usize,
    bus: EventBus,
}

impl PositionReconciler {
    pub fn new(bus: EventBus, seek_back_frames: usize, step_timeout: Duration) -> Self {
        Self {
            state: ReconcileState::Idle,
            mapper: None,
            slider: PositionSlider::default(),
            seek_back_frames,
            step_timeout,
            dropped_echoes: 0,
            bus,
        }
    }

    /// Start a new media session. `mapper` is `None` for time-only sessions.
    pub fn reset(&mut self, mapper: Option<FrameTimeMapper>, duration_ms: i64) {
        self.state = ReconcileState::Idle;
        self.mapper = mapper;
        self.slider = PositionSlider {
            value: 0,
            maximum: duration_ms.max(0),
            dragging: false,
        };
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    pub fn mapper(&self) -> Option<FrameTimeMapper> {
        self.mapper
    }

    pub fn slider(&self) -> PositionSlider {
        self.slider
    }

    pub fn set_slider_dragging(&mut self, dragging: bool) {
        self.slider.dragging = dragging;
    }

    pub fn set_step_timeout(&mut self, timeout: Duration) {
        self.step_timeout = timeout;
    }

    pub fn set_seek_back_frames(&mut self, frames: usize) {
        self.seek_back_frames = frames;
    }

    /// Notifications dropped because a reconciliation was in progress.
    pub fn dropped_echoes(&self) -> usize {
        self.dropped_echoes
    }

    /// The frame model's current frame changed.
    pub fn on_external_position_changed<T: Transport, M: FrameModel>(
        &mut self,
        sync: &mut TransportSync<T>,
        model: &M,
    ) -> Result<Outcome, SyncError> {
        if self.state != ReconcileState::Idle {
            self.dropped_echoes += 1;
            trace!("External position change ignored while {:?}", self.state);
            return Ok(Outcome::Ignored);
        }

        let frame = model.frame_pos();
        let mut outcome = Outcome::Unchanged;

        if let Some(mapper) = self.mapper
            && sync.transport().is_paused()
        {
            let target = mapper.frame_to_time(frame as i64);
            if target != sync.position() {
                self.state = ReconcileState::Reconciling(SyncDirection::ExternalToTransport);
                sync.set_position_muted(true);
                let landed = self.land_on_frame(sync, mapper, frame, target);
                sync.set_position_muted(false);
                self.state = ReconcileState::Idle;
                landed?;

                self.slider.value = target;
                outcome = Outcome::Applied;
            }
        }

        self.bus.emit(CursorMovedEvent(frame));
        Ok(outcome)
    }

    fn land_on_frame<T: Transport>(
        &mut self,
        sync: &mut TransportSync<T>,
        mapper: FrameTimeMapper,
        frame: usize,
        target: i64,
    ) -> Result<(), SyncError> {
        let back = mapper
            .frame_to_time(frame as i64 - self.seek_back_frames as i64)
            .max(0);
        debug!("Landing on frame {} ({} ms), seeking to {} ms first", frame, target, back);
        sync.seek_and_wait_until_finished(back)?;

        let mut stalled = 0;
        while sync.position() < target {
            let before = sync.position();
            sync.step_and_wait_until_finished(StepDirection::Forward, self.step_timeout)?;
            if sync.position() > before {
                stalled = 0;
                continue;
            }
            stalled += 1;
            if stalled >= MAX_STALLED_STEPS {
                warn!(
                    "Transport stuck at {} ms while stepping to {} ms, giving up",
                    sync.position(),
                    target
                );
                break;
            }
        }
        Ok(())
    }

    /// The transport reported a new position.
    pub fn on_transport_position_changed<T: Transport, M: FrameModel>(
        &mut self,
        sync: &mut TransportSync<T>,
        model: &mut M,
    ) -> Outcome {
        if self.state != ReconcileState::Idle {
            return Outcome::Ignored;
        }

        let position = sync.position();
        if self.slider.value == position {
            return Outcome::Unchanged;
        }
        if !sync.input_enabled() || self.slider.dragging {
            return Outcome::Ignored;
        }
        self.slider.value = position;

        if let Some(mapper) = self.mapper {
            let frame = mapper.time_to_frame(position);
            self.push_frame(sync, model, frame);

            if frame + 1 >= mapper.frame_count() && sync.state() == PlaybackState::Playing {
                debug!("Reached last frame {}, pausing", frame);
                sync.transport_mut().pause(true);
                self.bus.emit(PlaybackEndedEvent { frame });
            }
        }

        self.publish_frame_info(sync, model);
        Outcome::Applied
    }

    /// Operator moved the slider while media is open: update the frame model
    /// and issue a fire-and-forget seek.
    pub fn seek_by_slider<T: Transport, M: FrameModel>(
        &mut self,
        sync: &mut TransportSync<T>,
        model: &mut M,
        value_ms: i64,
    ) -> Outcome {
        if !sync.transport().is_playing() {
            return Outcome::Ignored;
        }
        self.slider.value = value_ms;
        if let Some(mapper) = self.mapper {
            let frame = mapper.time_to_frame(value_ms);
            self.push_frame(sync, model, frame);
        }
        self.publish_frame_info(sync, model);
        debug!("Seek by slider to {} ms", value_ms);
        sync.transport_mut().seek(value_ms);
        Outcome::Applied
    }

    /// Write a transport-derived frame into the model.
    fn push_frame<T: Transport, M: FrameModel>(
        &mut self,
        sync: &mut TransportSync<T>,
        model: &mut M,
        frame: usize,
    ) {
        self.state = ReconcileState::Reconciling(SyncDirection::TransportToExternal);
        model.set_frame_pos(frame);
        // The model announces changes synchronously; its echo arrives while
        // we still own the position and is dropped.
        let echo = self.on_external_position_changed(sync, &*model);
        debug_assert_eq!(echo, Ok(Outcome::Ignored));
        self.state = ReconcileState::Idle;
    }

    pub fn publish_frame_info<T: Transport, M: FrameModel>(&self, sync: &TransportSync<T>, model: &M) {
        let fallback = (sync.transport().duration() > 0).then(|| sync.position());
        self.bus.emit(frame_info(model, fallback));
    }
}

/// Build the frame/time labels for the model's current frame. Statistics
/// timestamps win; `fallback_ms` (the transport position) covers frames whose
/// statistics are not computed yet.
pub fn frame_info<M: FrameModel>(model: &M, fallback_ms: Option<i64>) -> FrameInfoChangedEvent {
    let frame = model.frame_pos();
    let frame_label = match model.frame_type(frame) {
        Some(kind) => format!("Frame {} [{}]", frame, kind),
        None => format!("Frame {}", frame),
    };
    let time_label = model
        .timestamp_ms(frame)
        .or(fallback_ms)
        .filter(|ms| *ms >= 0)
        .map(format_time_ms)
        .unwrap_or_default();
    FrameInfoChangedEvent {
        frame,
        frame_label,
        time_label,
    }
}
