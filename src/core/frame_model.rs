//! Frame-indexed position owned by the statistics side.
//!
//! The statistics/file model keeps its own "current frame" that plots and
//! comment views follow. The player never owns it; it only reads and writes
//! it through this trait.

/// Statistics/file model as seen by the player.
pub trait FrameModel {
    /// Total frames, 0 when unknown.
    fn frame_count(&self) -> usize;
    fn frame_pos(&self) -> usize;
    fn set_frame_pos(&mut self, frame: usize);
    /// Presentation timestamp from computed statistics, `None` while the
    /// statistics for `frame` are not available yet.
    fn timestamp_ms(&self, frame: usize) -> Option<i64>;
    /// Picture type label ("I", "P", "B") if known.
    fn frame_type(&self, _frame: usize) -> Option<String> {
        None
    }
}

/// In-memory frame model: a frame count plus whatever timestamps the
/// statistics pass has produced so far.
#[derive(Debug, Clone, Default)]
pub struct StatsTimeline {
    frame_count: usize,
    pos: usize,
    timestamps: Vec<i64>,
    frame_types: Vec<char>,
}

impl StatsTimeline {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count,
            ..Default::default()
        }
    }

    /// Record timestamps for frames `0..timestamps.len()`.
    pub fn with_timestamps(mut self, timestamps: Vec<i64>) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn with_frame_types(mut self, types: Vec<char>) -> Self {
        self.frame_types = types;
        self
    }

    /// Append one computed timestamp (statistics progress).
    pub fn push_timestamp(&mut self, ms: i64) {
        self.timestamps.push(ms);
    }

    /// Frames with statistics available.
    pub fn computed_frames(&self) -> usize {
        self.timestamps.len()
    }
}

impl FrameModel for StatsTimeline {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn frame_pos(&self) -> usize {
        self.pos
    }

    fn set_frame_pos(&mut self, frame: usize) {
        self.pos = if self.frame_count > 0 {
            frame.min(self.frame_count - 1)
        } else {
            frame
        };
    }

    fn timestamp_ms(&self, frame: usize) -> Option<i64> {
        self.timestamps.get(frame).copied()
    }

    fn frame_type(&self, frame: usize) -> Option<String> {
        self.frame_types.get(frame).map(|c| c.to_string())
    }
}
