//! Debounced filter graph application.
//!
//! Filter edits arrive in bursts (slider drags, several slots toggled in a
//! row). Each edit re-arms a single timer; the graph is rebuilt and installed
//! once, after the edits have been quiet for the configured delay.
//!
//! # Usage
//! ```ignore
//! // On every filter edit:
//! debounce.schedule();
//!
//! // In the update loop:
//! if debounce.tick() {
//!     player.apply_filters()?;
//! }
//! ```

use std::time::{Duration, Instant};

/// Quiet period before a pending application fires.
pub const DEFAULT_APPLY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct DebouncedApply {
    delay: Duration,
    /// When the pending application fires
    pending: Option<Instant>,
}

impl Default for DebouncedApply {
    fn default() -> Self {
        Self {
            delay: DEFAULT_APPLY_DELAY,
            pending: None,
        }
    }
}

impl DebouncedApply {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm (or re-arm) the timer.
    pub fn schedule(&mut self) {
        self.schedule_at(Instant::now());
    }

    pub fn schedule_at(&mut self, now: Instant) {
        self.pending = Some(now + self.delay);
        log::trace!("DebouncedApply: armed for {}ms", self.delay.as_millis());
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::trace!("DebouncedApply: cancelled");
        }
    }

    /// True once per burst, when the quiet period has elapsed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(fire_at) if now >= fire_at => {
                self.pending = None;
                log::trace!("DebouncedApply: firing");
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fire_before_delay() {
        let mut debounce = DebouncedApply::default();
        let t0 = Instant::now();
        debounce.schedule_at(t0);
        assert!(!debounce.tick_at(t0 + Duration::from_millis(99)));
        assert!(debounce.is_pending());
    }

    #[test]
    fn test_burst_fires_once() {
        let mut debounce = DebouncedApply::new(Duration::from_millis(100));
        let t0 = Instant::now();
        for i in 0..5 {
            debounce.schedule_at(t0 + Duration::from_millis(i * 30));
        }
        // last edit at +120, so +200 is still inside the quiet period
        assert!(!debounce.tick_at(t0 + Duration::from_millis(200)));
        assert!(debounce.tick_at(t0 + Duration::from_millis(220)));
        assert!(!debounce.tick_at(t0 + Duration::from_millis(400)));
    }

    #[test]
    fn test_cancel() {
        let mut debounce = DebouncedApply::new(Duration::from_millis(10));
        let t0 = Instant::now();
        debounce.schedule_at(t0);
        debounce.cancel();
        assert!(!debounce.tick_at(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_wall_clock_tick() {
        let mut debounce = DebouncedApply::new(Duration::from_millis(10));
        debounce.schedule();
        assert!(!debounce.tick());
        std::thread::sleep(Duration::from_millis(15));
        assert!(debounce.tick());
    }
}
