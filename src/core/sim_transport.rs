//! Deterministic in-process transport.
//!
//! Behaves like a real decode engine at the notification level: seeks snap
//! back to the previous keyframe, steps advance exactly one frame, and a step
//! that cannot move (stream boundary) completes silently without a
//! step-finished notification. Used by the headless CLI preview and by tests.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::trace;
use std::path::{Path, PathBuf};

use super::transport::{PlaybackState, Transport, TransportError, TransportEvent};

/// Default keyframe interval in frames.
pub const DEFAULT_GOP: usize = 12;

#[derive(Debug)]
pub struct SimTransport {
    events: Sender<TransportEvent>,
    frame_count: usize,
    duration_ms: i64,
    gop: usize,
    state: PlaybackState,
    frame: usize,
    path: Option<PathBuf>,
    filter_graph: String,
    speed: f64,
    silent_steps: bool,
    seeks: usize,
    steps: usize,
    loads: usize,
    graph_installs: usize,
}

impl SimTransport {
    /// Create a transport for media of `frame_count` frames lasting
    /// `duration_ms`. Returns the notification receiver alongside.
    pub fn new(frame_count: usize, duration_ms: i64) -> (Self, Receiver<TransportEvent>) {
        let (tx, rx) = unbounded();
        let transport = Self {
            events: tx,
            frame_count: frame_count.max(1),
            duration_ms: duration_ms.max(1),
            gop: DEFAULT_GOP,
            state: PlaybackState::Stopped,
            frame: 0,
            path: None,
            filter_graph: String::new(),
            speed: 1.0,
            silent_steps: false,
            seeks: 0,
            steps: 0,
            loads: 0,
            graph_installs: 0,
        };
        (transport, rx)
    }

    /// Keyframe interval seeks snap to (1 = every frame is a keyframe).
    pub fn with_gop(mut self, gop: usize) -> Self {
        self.gop = gop.max(1);
        self
    }

    /// Never emit step-finished notifications.
    pub fn with_silent_steps(mut self, silent: bool) -> Self {
        self.silent_steps = silent;
        self
    }

    fn emit(&self, event: TransportEvent) {
        trace!("SimTransport: {:?}", event);
        let _ = self.events.send(event);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.emit(TransportEvent::StateChanged(state));
        }
    }

    fn frame_time(&self, frame: usize) -> i64 {
        (self.duration_ms as i128 * frame as i128 / self.frame_count as i128) as i64
    }

    /// Index of the frame displayed at `time_ms`.
    fn frame_at(&self, time_ms: i64) -> usize {
        if time_ms <= 0 {
            return 0;
        }
        let frame = (time_ms as i128 * self.frame_count as i128 / self.duration_ms as i128) as usize;
        frame.min(self.frame_count - 1)
    }

    /// Simulate the playback clock: move `frames` forward while playing.
    pub fn advance(&mut self, frames: usize) {
        if self.state != PlaybackState::Playing || frames == 0 {
            return;
        }
        let next = (self.frame + frames).min(self.frame_count - 1);
        if next != self.frame {
            self.frame = next;
            self.emit(TransportEvent::PositionChanged(self.position()));
        }
    }

    pub fn current_frame(&self) -> usize {
        self.frame
    }

    pub fn filter_graph(&self) -> &str {
        &self.filter_graph
    }

    pub fn loaded_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn seek_count(&self) -> usize {
        self.seeks
    }

    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn load_count(&self) -> usize {
        self.loads
    }

    pub fn graph_installs(&self) -> usize {
        self.graph_installs
    }
}

impl Transport for SimTransport {
    fn load(&mut self, path: &Path) -> Result<(), TransportError> {
        if path.as_os_str().is_empty() {
            return Err(TransportError("empty path".to_string()));
        }
        self.path = Some(path.to_path_buf());
        self.frame = 0;
        self.loads += 1;
        Ok(())
    }

    fn play(&mut self) {
        self.set_state(PlaybackState::Playing);
    }

    fn pause(&mut self, paused: bool) {
        match (self.state, paused) {
            (PlaybackState::Playing, true) => self.set_state(PlaybackState::Paused),
            (PlaybackState::Paused, false) => self.set_state(PlaybackState::Playing),
            _ => {}
        }
    }

    fn stop(&mut self) {
        self.frame = 0;
        self.set_state(PlaybackState::Stopped);
    }

    fn seek(&mut self, position_ms: i64) {
        self.seeks += 1;
        let wanted = self.frame_at(position_ms);
        let landed = wanted / self.gop * self.gop;
        if landed != self.frame {
            self.frame = landed;
            self.emit(TransportEvent::PositionChanged(self.position()));
        }
        self.emit(TransportEvent::SeekFinished(self.position()));
    }

    fn step_forward(&mut self) {
        self.steps += 1;
        if self.frame + 1 >= self.frame_count {
            return;
        }
        self.frame += 1;
        self.set_state(PlaybackState::Paused);
        self.emit(TransportEvent::PositionChanged(self.position()));
        if !self.silent_steps {
            self.emit(TransportEvent::StepFinished);
        }
    }

    fn step_backward(&mut self) {
        self.steps += 1;
        if self.frame == 0 {
            return;
        }
        self.frame -= 1;
        self.set_state(PlaybackState::Paused);
        self.emit(TransportEvent::PositionChanged(self.position()));
        if !self.silent_steps {
            self.emit(TransportEvent::StepFinished);
        }
    }

    fn set_filter_graph(&mut self, graph: &str) {
        self.filter_graph = graph.to_string();
        self.graph_installs += 1;
    }

    fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    fn duration(&self) -> i64 {
        self.duration_ms
    }

    fn position(&self) -> i64 {
        self.frame_time(self.frame)
    }

    fn state(&self) -> PlaybackState {
        self.state
    }
}
