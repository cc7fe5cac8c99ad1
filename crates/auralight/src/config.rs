//! Application settings
//!
//! Loaded from a TOML file; every field is optional and falls back to its
//! default. Command line flags are applied on top in `main`.

use anyhow::{Context, Result};
use auralight_control::ModeKind;
use auralight_core::{AnimationParameters, LogConfig, PerformanceProfile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Simulated display feeding the test pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Display width in pixels
    pub width: u32,
    /// Display height in pixels
    pub height: u32,
    /// Frames delivered per second
    pub fps: u32,
    /// Seconds per full hue rotation of the pattern
    pub cycle_seconds: f32,
    /// End the capture session after this many seconds, simulating a lost
    /// display
    pub lose_after_seconds: Option<f32>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 60,
            cycle_seconds: 8.0,
            lose_after_seconds: None,
        }
    }
}

/// Simulated loudness input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Beats per minute of the synthetic kick
    pub bpm: f32,
    /// Samples delivered per second
    pub rate_hz: u32,
    /// Loudness between beats
    pub floor: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            rate_hz: 100,
            floor: 0.1,
        }
    }
}

/// Everything the binary can be configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Animation mode
    pub mode: ModeKind,
    /// Processing rate policy
    pub profile: PerformanceProfile,
    /// Run time in seconds, 0 runs until the process is killed
    pub run_seconds: u64,
    /// Seconds between status lines
    pub status_interval_seconds: u64,
    /// Animation parameters
    pub animation: AnimationParameters,
    /// Test pattern source
    pub display: DisplaySettings,
    /// Synthetic loudness source
    pub audio: AudioSettings,
    /// Logging
    pub logging: LogConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            mode: ModeKind::default(),
            profile: PerformanceProfile::default(),
            run_seconds: 10,
            status_interval_seconds: 1,
            animation: AnimationParameters::default(),
            display: DisplaySettings::default(),
            audio: AudioSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppSettings {
    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).context("Invalid settings file")?;
        Ok(settings.normalized())
    }

    /// Load settings from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to load {:?}", path))
    }

    /// Write settings to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    /// Clamp values read from an untrusted file
    pub fn normalized(mut self) -> Self {
        self.animation = self.animation.normalized();
        self.display.width = self.display.width.max(1);
        self.display.height = self.display.height.max(1);
        self.display.fps = self.display.fps.clamp(1, 240);
        self.audio.rate_hz = self.audio.rate_hz.clamp(1, 1000);
        self.audio.floor = self.audio.floor.clamp(0.0, 1.0);
        self.status_interval_seconds = self.status_interval_seconds.max(1);
        self
    }
}
