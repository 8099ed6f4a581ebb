//! Blocking, timeout-bounded control over an asynchronous transport.
//!
//! Every transport command returns immediately and completes later through a
//! [`TransportEvent`] on the notification channel. `TransportSync` turns each
//! command into an atomic step by blocking on that channel until the matching
//! notification arrives.
//!
//! # Wait policy
//!
//! - State transitions (play/pause/stop) and seeks: no timeout. Transports are
//!   assumed to always deliver these. An optional safety timeout can be set in
//!   [`SyncConfig::wait_timeout`]; exceeding it yields [`SyncError::Timeout`].
//! - Single-frame steps: bounded by the caller's timeout. Some transports never
//!   signal step completion at stream boundaries, so a timeout is not an error.
//!
//! Notifications received while waiting that are not the awaited one are kept
//! for the owner's event pump ([`TransportSync::drain_events`]), except
//! position changes arriving while position input is disabled or muted - those
//! would be ignored by the reconciler anyway.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info, trace};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use super::transport::{PlaybackState, StepDirection, Transport, TransportEvent};

/// Default per-step completion timeout.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Timeout for the single step issued by `play_to_position`.
    pub step_timeout: Duration,
    /// Safety timeout for otherwise unbounded waits. `None` waits forever.
    pub wait_timeout: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            step_timeout: DEFAULT_STEP_TIMEOUT,
            wait_timeout: None,
        }
    }
}

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Safety timeout expired while waiting for the named notification.
    Timeout(&'static str),
    /// The transport dropped its notification channel.
    Disconnected,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Timeout(what) => write!(f, "Transport did not report {} in time", what),
            SyncError::Disconnected => write!(f, "Transport notification channel closed"),
        }
    }
}

impl std::error::Error for SyncError {}

pub struct TransportSync<T: Transport> {
    transport: T,
    events: Receiver<TransportEvent>,
    pending: VecDeque<TransportEvent>,
    config: SyncConfig,
    /// Position input (slider) accepted; false during play-to-position.
    input_enabled: bool,
    /// Set by the reconciler while it drives the transport itself.
    position_muted: bool,
}

impl<T: Transport> TransportSync<T> {
    pub fn new(transport: T, events: Receiver<TransportEvent>, config: SyncConfig) -> Self {
        Self {
            transport,
            events,
            pending: VecDeque::new(),
            config,
            input_enabled: true,
            position_muted: false,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SyncConfig) {
        self.config = config;
    }

    pub fn position(&self) -> i64 {
        self.transport.position()
    }

    pub fn state(&self) -> PlaybackState {
        self.transport.state()
    }

    /// Whether position input is currently accepted.
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub(crate) fn set_position_muted(&mut self, muted: bool) {
        self.position_muted = muted;
    }

    /// Everything received but not consumed by a wait, oldest first.
    pub fn drain_events(&mut self) -> Vec<TransportEvent> {
        self.absorb();
        self.pending.drain(..).collect()
    }

    fn stash(&mut self, event: TransportEvent) {
        if let TransportEvent::PositionChanged(ms) = event
            && (!self.input_enabled || self.position_muted)
        {
            trace!("TransportSync: dropped position {} while input is held", ms);
            return;
        }
        self.pending.push_back(event);
    }

    /// Move already-delivered notifications into the pending queue so stale
    /// completions cannot satisfy the next wait.
    fn absorb(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.stash(event);
        }
    }

    fn safety_deadline(&self) -> Option<Instant> {
        self.config.wait_timeout.map(|t| Instant::now() + t)
    }

    fn next_event(
        &mut self,
        deadline: Option<Instant>,
        what: &'static str,
    ) -> Result<TransportEvent, SyncError> {
        match deadline {
            None => self.events.recv().map_err(|_| SyncError::Disconnected),
            Some(deadline) => self.events.recv_deadline(deadline).map_err(|e| match e {
                RecvTimeoutError::Timeout => SyncError::Timeout(what),
                RecvTimeoutError::Disconnected => SyncError::Disconnected,
            }),
        }
    }

    fn wait_for_state(&mut self, expected: PlaybackState, what: &'static str) -> Result<(), SyncError> {
        let deadline = self.safety_deadline();
        loop {
            if self.transport.state() == expected {
                return Ok(());
            }
            let event = self.next_event(deadline, what)?;
            self.stash(event);
        }
    }

    pub fn play_and_wait_until_playing(&mut self) -> Result<(), SyncError> {
        self.absorb();
        self.transport.play();
        self.wait_for_state(PlaybackState::Playing, "playing state")
    }

    pub fn pause_and_wait_until_paused(&mut self) -> Result<(), SyncError> {
        self.absorb();
        self.transport.pause(true);
        self.wait_for_state(PlaybackState::Paused, "paused state")
    }

    pub fn stop_and_wait_until_stopped(&mut self) -> Result<(), SyncError> {
        self.absorb();
        self.transport.stop();
        self.wait_for_state(PlaybackState::Stopped, "stopped state")
    }

    /// Seek and block until the transport reports the seek finished.
    /// Returns the position the transport landed on.
    pub fn seek_and_wait_until_finished(&mut self, target_ms: i64) -> Result<i64, SyncError> {
        self.absorb();
        let deadline = self.safety_deadline();
        self.transport.seek(target_ms);
        loop {
            match self.next_event(deadline, "seek completion")? {
                TransportEvent::SeekFinished(landed) => {
                    trace!("Seek to {} landed at {}", target_ms, landed);
                    return Ok(landed);
                }
                other => self.stash(other),
            }
        }
    }

    /// Step one frame and block until the transport reports the step finished
    /// or `timeout` elapses. A timeout is reported, not raised.
    pub fn step_and_wait_until_finished(
        &mut self,
        direction: StepDirection,
        timeout: Duration,
    ) -> Result<WaitOutcome, SyncError> {
        self.absorb();
        let deadline = Instant::now() + timeout;
        self.transport.step(direction);
        loop {
            match self.events.recv_deadline(deadline) {
                Ok(TransportEvent::StepFinished) => return Ok(WaitOutcome::Completed),
                Ok(other) => self.stash(other),
                Err(RecvTimeoutError::Timeout) => {
                    debug!("Step {:?}: no completion within {:?}, continuing", direction, timeout);
                    return Ok(WaitOutcome::TimedOut);
                }
                Err(RecvTimeoutError::Disconnected) => return Err(SyncError::Disconnected),
            }
        }
    }

    /// Park a paused transport exactly on `target_ms`.
    ///
    /// Plays, pauses, seeks and then corrects a coarse seek landing with at
    /// most one single-frame step. Position input is disabled for the whole
    /// sequence and re-enabled even if a wait fails. The final position is
    /// re-announced to the event pump afterwards.
    pub fn play_to_position(&mut self, target_ms: i64) -> Result<(), SyncError> {
        info!("Play to {} ms", target_ms);
        self.input_enabled = false;
        let result = self.play_to_position_inner(target_ms);
        self.input_enabled = true;
        self.pending
            .push_back(TransportEvent::PositionChanged(self.transport.position()));
        info!("Play to {} ms done at {} ms", target_ms, self.transport.position());
        result
    }

    fn play_to_position_inner(&mut self, target_ms: i64) -> Result<(), SyncError> {
        self.play_and_wait_until_playing()?;
        self.pause_and_wait_until_paused()?;
        self.seek_and_wait_until_finished(target_ms)?;

        let position = self.transport.position();
        let step_timeout = self.config.step_timeout;
        if position > target_ms {
            self.step_and_wait_until_finished(StepDirection::Backward, step_timeout)?;
        } else if position < target_ms {
            self.step_and_wait_until_finished(StepDirection::Forward, step_timeout)?;
        }
        Ok(())
    }
}
