use clap::Parser;
use std::path::PathBuf;

use crate::filters::LayoutMode;

// Media probing backend (compile-time)
#[cfg(feature = "ffmpeg")]
const PROBE_BACKEND: &str = "playa-ffmpeg 8.0 (static)";
#[cfg(not(feature = "ffmpeg"))]
const PROBE_BACKEND: &str = "none (explicit geometry)";

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Probe:  ", PROBE_BACKEND, "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Frame-accurate QC player core: composes inspection filtergraphs and lands
/// a headless session on a frame or time
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Video file to open - optional, without it only the graph is composed
    #[arg(value_name = "FILE")]
    pub file_path: Option<PathBuf>,

    /// View arrangement
    #[arg(long = "layout", value_enum)]
    pub layout: Option<LayoutMode>,

    /// Filter per view slot, in order (replaces the default selection; max 6)
    #[arg(short = 'f', long = "filter", value_name = "NAME")]
    pub filters: Vec<String>,

    /// Signal adjustment applied before the views are split
    #[arg(long = "adjust", value_name = "NAME")]
    pub adjustment: Option<String>,

    /// Scale every view back to the source size
    #[arg(long = "fit-to-grid")]
    pub fit_to_grid: bool,

    /// Append a graph monitor stage
    #[arg(long = "graph-monitor")]
    pub graph_monitor: bool,

    /// Land on this frame (0-based)
    #[arg(long = "frame", value_name = "N")]
    pub frame: Option<usize>,

    /// Land on this time (SS, SS.mmm, MM:SS, HH:MM:SS[.mmm]; bare integers are ms)
    #[arg(short = 'g', long = "goto", value_name = "TIME")]
    pub goto: Option<String>,

    /// Output scale in percent instead of fitting the viewport
    #[arg(long = "scale", value_name = "PERCENT")]
    pub scale: Option<u32>,

    /// Area available to the picture, e.g. 1280x720 (default: source size)
    #[arg(long = "viewport", value_name = "WxH", value_parser = parse_size)]
    pub viewport: Option<(u32, u32)>,

    /// Frame count when probing is unavailable (0 = unknown)
    #[arg(long = "frame-count", value_name = "N")]
    pub frame_count: Option<usize>,

    /// Duration in milliseconds when probing is unavailable
    #[arg(long = "duration-ms", value_name = "MS")]
    pub duration_ms: Option<i64>,

    /// Source width
    #[arg(long = "width", value_name = "W")]
    pub width: Option<u32>,

    /// Source height
    #[arg(long = "height", value_name = "H")]
    pub height: Option<u32>,

    /// Display aspect ratio
    #[arg(long = "dar", value_name = "X")]
    pub dar: Option<f64>,

    /// Print the filter catalog and exit
    #[arg(long = "list-filters")]
    pub list_filters: bool,

    /// Enable debug logging to file (default: qcplay.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Write the effective settings back to qcplay.json
    #[arg(long = "save-settings")]
    pub save_settings: bool,
}

fn parse_size(text: &str) -> Result<(u32, u32), String> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", text))?;
    let w = w.trim().parse().map_err(|e| format!("width: {}", e))?;
    let h = h.trim().parse().map_err(|e| format!("height: {}", e))?;
    Ok((w, h))
}
