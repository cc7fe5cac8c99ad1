//! User-tunable animation parameters.
//!
//! Every setter normalizes its input into the valid range. Out-of-range
//! values are never an error.

use serde::{Deserialize, Serialize};

use crate::color::ZoneColor;
use crate::extractor::DEFAULT_TOP_FRACTION;

/// How the capture region is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// One pixel per zone from a 2x1 capture
    #[default]
    PointProbe,
    /// Weighted top-percentile sampling over a 32-column grid
    Dense,
}

/// Parameters shared by every animation mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationParameters {
    response: f32,
    sensitivity: f32,
    saturation_boost: f32,
    target_brightness: u8,
    sampling: SamplingMode,
    single_color: bool,
    top_fraction: f32,
    static_color: ZoneColor,
}

impl Default for AnimationParameters {
    fn default() -> Self {
        Self {
            response: 0.5,
            sensitivity: 0.5,
            saturation_boost: 0.0,
            target_brightness: 255,
            sampling: SamplingMode::PointProbe,
            single_color: false,
            top_fraction: DEFAULT_TOP_FRACTION,
            static_color: ZoneColor::WHITE,
        }
    }
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl AnimationParameters {
    /// Blend aggressiveness in `0.0..=1.0`
    pub fn response(&self) -> f32 {
        self.response
    }

    /// Set the blend aggressiveness
    pub fn set_response(&mut self, response: f32) {
        self.response = unit(response);
    }

    /// Audio sensitivity in `0.0..=1.0`
    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Set the audio sensitivity
    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = unit(sensitivity);
    }

    /// Saturation boost in `0.0..=1.0`
    pub fn saturation_boost(&self) -> f32 {
        self.saturation_boost
    }

    /// Set the saturation boost
    pub fn set_saturation_boost(&mut self, boost: f32) {
        self.saturation_boost = unit(boost);
    }

    /// Brightness the output settles at
    pub fn target_brightness(&self) -> u8 {
        self.target_brightness
    }

    /// Set the target brightness, clamped to `0..=255`
    pub fn set_target_brightness(&mut self, brightness: i32) {
        self.target_brightness = brightness.clamp(0, 255) as u8;
    }

    /// Sampling mode
    pub fn sampling(&self) -> SamplingMode {
        self.sampling
    }

    /// Set the sampling mode
    pub fn set_sampling(&mut self, sampling: SamplingMode) {
        self.sampling = sampling;
    }

    /// Whether dense sampling is enabled
    pub fn dense_sampling(&self) -> bool {
        self.sampling == SamplingMode::Dense
    }

    /// Whether both zones share one color
    pub fn single_color(&self) -> bool {
        self.single_color
    }

    /// Use one color for both zones
    pub fn set_single_color(&mut self, single: bool) {
        self.single_color = single;
    }

    /// Fraction of highest-weight pixels kept by dense sampling
    pub fn top_fraction(&self) -> f32 {
        self.top_fraction
    }

    /// Set the retained fraction; values outside `(0, 1]` are clamped and
    /// a non-positive fraction still keeps one pixel.
    pub fn set_top_fraction(&mut self, fraction: f32) {
        self.top_fraction = unit(fraction);
    }

    /// Color used by the static mode
    pub fn static_color(&self) -> ZoneColor {
        self.static_color
    }

    /// Set the static mode color
    pub fn set_static_color(&mut self, color: ZoneColor) {
        self.static_color = color;
    }

    /// Re-apply every clamp, used after deserializing untrusted values
    pub fn normalized(mut self) -> Self {
        self.response = unit(self.response);
        self.sensitivity = unit(self.sensitivity);
        self.saturation_boost = unit(self.saturation_boost);
        self.top_fraction = unit(self.top_fraction);
        self
    }
}
