//! Output picture size: fit to the viewport, or a fixed percentage of the
//! frame.
//!
//! The resulting size is what `${window_width}`/`${window_height}` resolve to.
//! The scale slider maps its lower half to 50-100% and its upper half to
//! 100-200%.

use log::debug;
use serde::{Deserialize, Serialize};

pub const MIN_SCALE_PERCENT: u32 = 50;
pub const NORMAL_SCALE_PERCENT: u32 = 100;
pub const MAX_SCALE_PERCENT: u32 = 200;

/// How the output size follows the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Largest size with the frame's aspect that fits the viewport
    #[default]
    Fit,
    /// 100%, resets the percentage
    Normal,
    /// Any percentage, independent of the viewport
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputScale {
    mode: ScaleMode,
    percent: u32,
}

impl Default for OutputScale {
    fn default() -> Self {
        Self {
            mode: ScaleMode::Fit,
            percent: NORMAL_SCALE_PERCENT,
        }
    }
}

impl OutputScale {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn percent(&self) -> u32 {
        self.percent
    }

    pub fn set_fit(&mut self) {
        self.mode = ScaleMode::Fit;
    }

    pub fn set_normal(&mut self) {
        self.mode = ScaleMode::Normal;
        self.percent = NORMAL_SCALE_PERCENT;
    }

    /// Set the percentage. Anything but 100% switches to free scale.
    pub fn set_percent(&mut self, percent: u32) {
        self.percent = percent.max(1);
        if self.percent != NORMAL_SCALE_PERCENT {
            self.mode = ScaleMode::Free;
        }
        debug!("Output scale {}% ({:?})", self.percent, self.mode);
    }

    /// Set the percentage from a scale slider position in `min..=max`.
    pub fn set_slider(&mut self, value: i32, min: i32, max: i32) {
        self.set_percent(slider_to_percent(value, min, max));
    }

    /// Output size for a `frame` shown in an `available` viewport.
    pub fn output_size(&self, frame: (u32, u32), available: (u32, u32)) -> (u32, u32) {
        let (fw, fh) = (frame.0 as u64, frame.1 as u64);
        match self.mode {
            ScaleMode::Fit => {
                if fw == 0 || fh == 0 {
                    return (0, 0);
                }
                // one pixel is kept free so the viewport never scrolls
                let aw = available.0.saturating_sub(1) as u64;
                let ah = available.1.saturating_sub(1) as u64;
                let height = fh * aw / fw;
                if height <= ah {
                    (aw as u32, height as u32)
                } else {
                    ((fw * ah / fh) as u32, ah as u32)
                }
            }
            ScaleMode::Normal | ScaleMode::Free => {
                let p = self.percent as u64;
                (((fw * p + 50) / 100) as u32, ((fh * p + 50) / 100) as u32)
            }
        }
    }
}

/// Slider position to a percentage: the lower half of the range covers
/// 50-100%, the upper half 100-200%.
pub fn slider_to_percent(value: i32, min: i32, max: i32) -> u32 {
    let half = (max - min) / 2;
    if half <= 0 {
        return NORMAL_SCALE_PERCENT;
    }
    let value = value.clamp(min, max);
    let (lo, avg, hi) = (MIN_SCALE_PERCENT as i32, NORMAL_SCALE_PERCENT as i32, MAX_SCALE_PERCENT as i32);
    let percent = if value - min <= half {
        (avg - lo) * (value - min) / half + lo
    } else {
        (hi - avg) * (value - min - half) / half + avg
    };
    percent as u32
}

/// Inverse of [`slider_to_percent`], clamped to 50-200%.
pub fn percent_to_slider(percent: u32, min: i32, max: i32) -> i32 {
    let half = (max - min) / 2;
    let percent = percent.clamp(MIN_SCALE_PERCENT, MAX_SCALE_PERCENT) as i32;
    let (lo, avg, hi) = (MIN_SCALE_PERCENT as i32, NORMAL_SCALE_PERCENT as i32, MAX_SCALE_PERCENT as i32);
    if percent <= avg {
        min + half * (percent - lo) / (avg - lo)
    } else {
        min + half + half * (percent - avg) / (hi - avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_width_bound() {
        let scale = OutputScale::new();
        assert_eq!(scale.output_size((720, 480), (1024, 768)), (1023, 682));
    }

    #[test]
    fn test_fit_height_bound() {
        let scale = OutputScale::new();
        // 1919 wide would need 1079 high; only 599 available
        assert_eq!(scale.output_size((1920, 1080), (1920, 600)), (1064, 599));
        assert_eq!(scale.output_size((0, 1080), (1920, 600)), (0, 0));
    }

    #[test]
    fn test_percent_switches_to_free() {
        let mut scale = OutputScale::new();
        scale.set_percent(100);
        assert_eq!(scale.mode(), ScaleMode::Fit);
        scale.set_percent(150);
        assert_eq!(scale.mode(), ScaleMode::Free);
        assert_eq!(scale.output_size((720, 480), (10, 10)), (1080, 720));

        scale.set_normal();
        assert_eq!(scale.percent(), 100);
        assert_eq!(scale.output_size((720, 486), (10, 10)), (720, 486));
    }

    #[test]
    fn test_slider_mapping() {
        assert_eq!(slider_to_percent(0, 0, 100), 50);
        assert_eq!(slider_to_percent(25, 0, 100), 75);
        assert_eq!(slider_to_percent(50, 0, 100), 100);
        assert_eq!(slider_to_percent(75, 0, 100), 150);
        assert_eq!(slider_to_percent(100, 0, 100), 200);
        assert_eq!(slider_to_percent(7, 0, 0), 100);

        assert_eq!(percent_to_slider(50, 0, 100), 0);
        assert_eq!(percent_to_slider(100, 0, 100), 50);
        assert_eq!(percent_to_slider(150, 0, 100), 75);
        assert_eq!(percent_to_slider(400, 0, 100), 100);
        assert_eq!(percent_to_slider(10, 0, 100), 0);
    }

    #[test]
    fn test_slider_sets_free_percent() {
        let mut scale = OutputScale::new();
        scale.set_slider(100, 0, 100);
        assert_eq!((scale.mode(), scale.percent()), (ScaleMode::Free, 200));
    }
}
