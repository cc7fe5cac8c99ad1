//! Command line flags layered over the settings file.

use auralight_control::ModeKind;
use auralight_core::{PerformanceProfile, SamplingMode, ZoneColor};
use clap::Parser;
use std::path::PathBuf;

use crate::config::AppSettings;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "auralight",
    version,
    about = "Screen and audio reactive ambient lighting, driven by synthetic sources"
)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Write the effective settings to this path and exit
    #[arg(long)]
    pub write_config: Option<PathBuf>,

    /// frame_driven, fused_clock or static
    #[arg(long, short)]
    pub mode: Option<ModeKind>,

    /// low, medium, high or ragnarok
    #[arg(long, short)]
    pub profile: Option<PerformanceProfile>,

    /// Seconds to run, 0 runs until killed
    #[arg(long, short = 't')]
    pub seconds: Option<u64>,

    /// Use weighted sampling over the whole frame
    #[arg(long)]
    pub dense: bool,

    /// Drive both sides with one color
    #[arg(long)]
    pub single_color: bool,

    /// Blend aggressiveness, 0..1
    #[arg(long)]
    pub response: Option<f32>,

    /// Audio sensitivity, 0..1
    #[arg(long)]
    pub sensitivity: Option<f32>,

    /// Saturation boost, 0..1
    #[arg(long)]
    pub saturation: Option<f32>,

    /// Target brightness, 0..255
    #[arg(long)]
    pub brightness: Option<i32>,

    /// Static mode color as #rrggbb
    #[arg(long, value_parser = parse_hex_color)]
    pub color: Option<ZoneColor>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also log to a file in the configured log directory
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Layer the flags that were given over `settings`
    pub fn apply(&self, settings: &mut AppSettings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(profile) = self.profile {
            settings.profile = profile;
        }
        if let Some(seconds) = self.seconds {
            settings.run_seconds = seconds;
        }
        if self.dense {
            settings.animation.set_sampling(SamplingMode::Dense);
        }
        if self.single_color {
            settings.animation.set_single_color(true);
        }
        if let Some(response) = self.response {
            settings.animation.set_response(response);
        }
        if let Some(sensitivity) = self.sensitivity {
            settings.animation.set_sensitivity(sensitivity);
        }
        if let Some(saturation) = self.saturation {
            settings.animation.set_saturation_boost(saturation);
        }
        if let Some(brightness) = self.brightness {
            settings.animation.set_target_brightness(brightness);
        }
        if let Some(color) = self.color {
            settings.animation.set_static_color(color);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
        if self.log_file {
            settings.logging.file_output = true;
        }
    }
}

/// Parse `#rrggbb` or `rrggbb`
pub fn parse_hex_color(s: &str) -> Result<ZoneColor, String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("expected #rrggbb, got '{}'", s));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|e| format!("invalid color '{}': {}", s, e))
    };
    Ok(ZoneColor::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
