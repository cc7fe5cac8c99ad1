//! Temporal blending of colors, brightness and audio intensity.
//!
//! Every step moves a current value toward a target by
//! `current + (target - current) * factor`, where the factor is derived
//! from the user-facing response through a [`BlendCurve`].

use serde::{Deserialize, Serialize};

use crate::color::{channel_from_f32, ZoneColor};

/// Linear mapping from response `0.0..=1.0` onto a blend factor range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendCurve {
    /// Factor at response 0
    pub min: f32,
    /// Factor at response 1
    pub max: f32,
}

impl BlendCurve {
    /// Hue/chroma blending
    pub const COLOR: Self = Self::new(0.10, 0.90);
    /// Brightness blending in the frame-driven mode
    pub const BRIGHTNESS: Self = Self::new(0.10, 0.90);
    /// Brightness blending when brightness follows audio
    pub const BRIGHTNESS_AUDIO: Self = Self::new(0.25, 1.00);
    /// Smoothed intensity moving up (attack)
    pub const INTENSITY_RISE: Self = Self::new(0.20, 0.90);
    /// Smoothed intensity moving down (release)
    pub const INTENSITY_FALL: Self = Self::new(0.07, 0.70);
    /// Static color mode, color and brightness alike
    pub const STATIC: Self = Self::new(0.15, 0.85);

    /// Create a curve
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Blend factor for `response`, clamped to `0.0..=1.0` first
    pub fn factor(&self, response: f32) -> f32 {
        let response = if response.is_nan() {
            0.0
        } else {
            response.clamp(0.0, 1.0)
        };
        self.min + (self.max - self.min) * response
    }
}

fn clamp_factor(factor: f32) -> f32 {
    if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    }
}

/// One interpolation step between floats
pub fn lerp_f32(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * clamp_factor(factor)
}

/// One interpolation step between 8-bit values, rounded to nearest
pub fn lerp_u8(current: u8, target: u8, factor: f32) -> u8 {
    channel_from_f32(lerp_f32(current as f32, target as f32, factor))
}

/// One interpolation step between colors, channel by channel.
///
/// A black target is the "no signal" sentinel and is applied immediately.
pub fn blend_color(current: ZoneColor, target: ZoneColor, factor: f32) -> ZoneColor {
    if target.is_black() {
        return ZoneColor::BLACK;
    }
    ZoneColor::new(
        lerp_u8(current.r, target.r, factor),
        lerp_u8(current.g, target.g, factor),
        lerp_u8(current.b, target.b, factor),
    )
}

/// Noise floor for a sensitivity: `0.05 + 0.25 * (1 - sensitivity)`
pub fn noise_floor(sensitivity: f32) -> f32 {
    0.05 + 0.25 * (1.0 - sensitivity.clamp(0.0, 1.0))
}

/// Map a raw loudness onto a brightness multiplier.
///
/// Values at or below the noise floor are silence; the rest is normalized
/// above the floor and amplified by `0.5 + 1.5 * sensitivity`.
pub fn map_intensity(intensity: f32, sensitivity: f32) -> f32 {
    let intensity = sanitize_intensity(intensity);
    let sensitivity = if sensitivity.is_nan() {
        0.0
    } else {
        sensitivity.clamp(0.0, 1.0)
    };
    let floor = noise_floor(sensitivity);
    if intensity <= floor {
        return 0.0;
    }
    let norm = ((intensity - floor) / (1.0 - floor)).clamp(0.0, 1.0);
    (norm * (0.5 + 1.5 * sensitivity)).clamp(0.0, 1.0)
}

/// Clamp a loudness sample to `0.0..=1.0`; non-finite input is silence
pub fn sanitize_intensity(intensity: f32) -> f32 {
    if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Advances smoothed values toward their targets for one tick.
///
/// Built from the current response each tick so parameter changes apply
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalBlender {
    response: f32,
}

impl TemporalBlender {
    /// Create a blender for `response` in `0.0..=1.0`
    pub fn new(response: f32) -> Self {
        Self {
            response: clamp_factor(response),
        }
    }

    /// Response in use
    pub fn response(&self) -> f32 {
        self.response
    }

    /// Blend a zone color toward `target` with the color curve
    pub fn step_color(&self, current: &mut ZoneColor, target: ZoneColor) {
        *current = blend_color(*current, target, BlendCurve::COLOR.factor(self.response));
    }

    /// Blend a brightness toward `target` along `curve`
    pub fn step_brightness(&self, current: &mut u8, target: u8, curve: BlendCurve) {
        *current = lerp_u8(*current, target, curve.factor(self.response));
    }

    /// Envelope-follow a raw loudness sample.
    ///
    /// Uses the rise curve while the sample is above the smoothed value and
    /// the fall curve otherwise.
    pub fn step_intensity(&self, smoothed: &mut f32, raw: f32) {
        let raw = sanitize_intensity(raw);
        let curve = if raw > *smoothed {
            BlendCurve::INTENSITY_RISE
        } else {
            BlendCurve::INTENSITY_FALL
        };
        *smoothed = lerp_f32(*smoothed, raw, curve.factor(self.response)).clamp(0.0, 1.0);
    }
}
