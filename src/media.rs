//! Media probing - frame count, duration and geometry of a video file.
//!
//! Probing needs FFmpeg and is only available with the `ffmpeg` feature.
//! Without it callers supply the values themselves (see `MediaInfo::new`).

use std::path::Path;

#[derive(Debug, Clone)]
pub enum MediaError {
    /// Built without the `ffmpeg` feature.
    Unsupported,
    Open(String),
    NoVideoStream,
    Decoder(String),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::Unsupported => write!(f, "Media probing requires the 'ffmpeg' feature"),
            MediaError::Open(e) => write!(f, "Failed to open media: {}", e),
            MediaError::NoVideoStream => write!(f, "No video stream found"),
            MediaError::Decoder(e) => write!(f, "Decoder error: {}", e),
        }
    }
}

impl std::error::Error for MediaError {}

/// What the player needs to know about a file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// 0 when unknown (time-only navigation)
    pub frame_count: usize,
    pub duration_ms: i64,
    pub width: u32,
    pub height: u32,
    /// Display aspect ratio
    pub dar: f64,
}

impl MediaInfo {
    /// Build from known values. A non-positive `dar` falls back to square
    /// pixels.
    pub fn new(frame_count: usize, duration_ms: i64, width: u32, height: u32, dar: f64) -> Self {
        let dar = if dar > 0.0 && dar.is_finite() {
            dar
        } else if height > 0 {
            width as f64 / height as f64
        } else {
            1.0
        };
        Self {
            frame_count,
            duration_ms: duration_ms.max(0),
            width,
            height,
            dar,
        }
    }

    #[cfg(feature = "ffmpeg")]
    pub fn probe(path: &Path) -> Result<Self, MediaError> {
        use playa_ffmpeg as ffmpeg;

        ffmpeg::init().map_err(|e| MediaError::Open(e.to_string()))?;
        let ictx = ffmpeg::format::input(path).map_err(|e| MediaError::Open(e.to_string()))?;
        let stream = ictx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(MediaError::NoVideoStream)?;

        let time_base = stream.time_base();
        let duration_secs = if stream.duration() > 0 {
            stream.duration() as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
        } else {
            // container duration is in AV_TIME_BASE units
            ictx.duration().max(0) as f64 / 1_000_000.0
        };
        let fps = stream.avg_frame_rate();
        let frame_count = if stream.frames() > 0 {
            stream.frames() as usize
        } else if fps.denominator() != 0 {
            (duration_secs * fps.numerator() as f64 / fps.denominator() as f64) as usize
        } else {
            0
        };

        let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| MediaError::Decoder(e.to_string()))?;
        let (width, height) = (decoder.width(), decoder.height());
        let sar = decoder.aspect_ratio();
        let dar = if sar.numerator() > 0 && sar.denominator() > 0 && height > 0 {
            width as f64 * sar.numerator() as f64 / (height as f64 * sar.denominator() as f64)
        } else {
            0.0
        };

        let info = Self::new(frame_count, (duration_secs * 1000.0) as i64, width, height, dar);
        log::info!(
            "Probed {}: {} frames, {} ms, {}x{} DAR {:.4}",
            path.display(),
            info.frame_count,
            info.duration_ms,
            info.width,
            info.height,
            info.dar
        );
        Ok(info)
    }

    #[cfg(not(feature = "ffmpeg"))]
    pub fn probe(_path: &Path) -> Result<Self, MediaError> {
        Err(MediaError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dar_fallback_to_square_pixels() {
        let info = MediaInfo::new(100, 4000, 720, 480, 0.0);
        assert!((info.dar - 1.5).abs() < 1e-9);
        let info = MediaInfo::new(100, 4000, 720, 480, 4.0 / 3.0);
        assert!((info.dar - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(MediaInfo::new(0, -5, 0, 0, f64::NAN).dar, 1.0);
    }

    #[cfg(not(feature = "ffmpeg"))]
    #[test]
    fn test_probe_unsupported_without_ffmpeg() {
        assert!(matches!(
            MediaInfo::probe(Path::new("clip.mkv")),
            Err(MediaError::Unsupported)
        ));
    }
}
