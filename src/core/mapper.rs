//! Frame <-> presentation time conversion.
//!
//! Statistics views address video by integer frame index, the transport by
//! millisecond position. The mapper is the only place the two meet.
//!
//! Rounding: frame -> time truncates, time -> frame rounds up. Together they
//! guarantee `time_to_frame(frame_to_time(f)) >= f`, so a step-correction loop
//! driven by the mapped time never stops short of the requested frame.

/// Pure frame/time converter for one media session.
///
/// Only exists when both frame count and duration are known; sessions with
/// an unknown frame count navigate by time only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTimeMapper {
    frame_count: u64,
    duration_ms: i64,
}

impl FrameTimeMapper {
    /// Returns `None` if either value is zero/unknown.
    pub fn new(frame_count: usize, duration_ms: i64) -> Option<Self> {
        if frame_count == 0 || duration_ms <= 0 {
            return None;
        }
        Some(Self {
            frame_count: frame_count as u64,
            duration_ms,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count as usize
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    /// Duration of a single frame, rounded down (at least 1 ms).
    pub fn frame_duration_ms(&self) -> i64 {
        (self.duration_ms / self.frame_count as i64).max(1)
    }

    /// `duration * frame / frame_count`, truncated. Negative frames map to
    /// negative times; callers clamp where needed.
    pub fn frame_to_time(&self, frame: i64) -> i64 {
        let ms = self.duration_ms as i128 * frame as i128 / self.frame_count as i128;
        ms as i64
    }

    /// `ceil(time * frame_count / duration)`. Never negative.
    pub fn time_to_frame(&self, time_ms: i64) -> usize {
        if time_ms <= 0 {
            return 0;
        }
        let num = time_ms as i128 * self.frame_count as i128;
        let den = self.duration_ms as i128;
        ((num + den - 1) / den) as usize
    }
}
