//! Persisted application settings (`qcplay.json`).

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::output_scale::OutputScale;
use crate::core::player::{DEFAULT_FILTERS, DEFAULT_SPEED_PERCENT, PlayerOptions};
use crate::core::reconciler::DEFAULT_SEEK_BACK_FRAMES;
use crate::core::sync::SyncConfig;
use crate::filters::{FilterChain, FontResource, GraphOptions, LayoutMode};

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    // Filters
    pub layout: LayoutMode,
    pub fit_to_grid: bool,
    pub graph_monitor: bool,
    pub default_filters: Vec<Option<String>>,
    pub default_adjustment: Option<String>,
    pub apply_delay_ms: u64, // Debounce before a filter edit is applied (default 100)

    // Output
    pub output_scale: OutputScale,

    // Playback
    pub speed_percent: u32,
    pub step_timeout_ms: u64,
    pub seek_back_frames: usize,
    pub transport_wait_timeout_ms: Option<u64>, // None = wait forever

    // Resources
    pub font_source: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            layout: LayoutMode::default(),
            fit_to_grid: false,
            graph_monitor: false,
            default_filters: DEFAULT_FILTERS.iter().map(|n| Some(n.to_string())).collect(),
            default_adjustment: None,
            apply_delay_ms: 100,
            output_scale: OutputScale::default(),
            speed_percent: DEFAULT_SPEED_PERCENT,
            step_timeout_ms: 1000,
            seek_back_frames: DEFAULT_SEEK_BACK_FRAMES,
            transport_wait_timeout_ms: None,
            font_source: None,
        }
    }
}

impl AppSettings {
    /// Load from `path`. A missing file yields defaults; a malformed one is
    /// reported and replaced by defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        match serde_json::from_str(&text) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            layout: self.layout,
            fit_to_grid: self.fit_to_grid,
            graph_monitor: self.graph_monitor,
        }
    }

    /// Persist the chain's slot order and selections as the new defaults.
    pub fn remember_chain(&mut self, chain: &FilterChain) {
        self.default_filters = chain.slot_names();
        self.default_adjustment = chain.adjustment().filter_name().map(str::to_string);
    }

    /// Player construction options; `temp_root` hosts runtime resources.
    pub fn player_options(&self, temp_root: &Path) -> PlayerOptions {
        PlayerOptions {
            sync: SyncConfig {
                step_timeout: Duration::from_millis(self.step_timeout_ms),
                wait_timeout: self.transport_wait_timeout_ms.map(Duration::from_millis),
            },
            seek_back_frames: self.seek_back_frames,
            apply_delay: Duration::from_millis(self.apply_delay_ms),
            speed_percent: self.speed_percent,
            graph: self.graph_options(),
            default_filters: self.default_filters.clone(),
            default_adjustment: self.default_adjustment.clone(),
            output_scale: self.output_scale,
            font: FontResource::new(self.font_source.clone(), temp_root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("qcplay_settings_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_save_load() {
        let path = temp_file("roundtrip");
        let settings = AppSettings {
            layout: LayoutMode::Horizontal,
            transport_wait_timeout_ms: Some(5000),
            default_filters: vec![Some("Histogram".into()), None],
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(AppSettings::load(&path).unwrap(), settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_fields_default() {
        let path = temp_file("partial");
        std::fs::write(&path, r#"{ "layout": "vertical", "speed_percent": 50 }"#).unwrap();
        let settings = AppSettings::load(&path).unwrap();
        assert_eq!(settings.layout, LayoutMode::Vertical);
        assert_eq!(settings.speed_percent, 50);
        assert_eq!(settings.seek_back_frames, DEFAULT_SEEK_BACK_FRAMES);
        assert_eq!(settings.default_filters.len(), 4);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_and_missing_files() {
        let path = temp_file("broken");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppSettings::load(&path).unwrap(), AppSettings::default());
        let _ = std::fs::remove_file(&path);
        assert_eq!(AppSettings::load(&path).unwrap(), AppSettings::default());
    }

    #[test]
    fn test_remember_chain_keeps_order() {
        let mut chain = FilterChain::new();
        chain
            .load_defaults(&[Some("Normal".into()), Some("Waveform".into())], Some("Adjust Signal"))
            .unwrap();
        chain.move_slot(0, 1).unwrap();

        let mut settings = AppSettings::default();
        settings.remember_chain(&chain);
        assert_eq!(settings.default_filters[0].as_deref(), Some("Waveform"));
        assert_eq!(settings.default_filters[1].as_deref(), Some("Normal"));
        assert_eq!(settings.default_filters.len(), 6);
        assert_eq!(settings.default_adjustment.as_deref(), Some("Adjust Signal"));
    }

    #[test]
    fn test_player_options() {
        let settings = AppSettings {
            step_timeout_ms: 250,
            ..Default::default()
        };
        let options = settings.player_options(&std::env::temp_dir());
        assert_eq!(options.sync.step_timeout, Duration::from_millis(250));
        assert_eq!(options.sync.wait_timeout, None);
        assert_eq!(options.apply_delay, Duration::from_millis(100));
    }
}
