//! Color primitives shared by the extraction and blending stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit RGB triple driving one spatial zone.
///
/// Exact black doubles as the "no signal" sentinel: the blender never
/// interpolates toward it, it snaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ZoneColor {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl ZoneColor {
    /// The black sentinel
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Full white
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create a color from its channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from floating point channels in `0.0..=255.0`.
    ///
    /// Channels are rounded to nearest and clamped; NaN maps to 0.
    pub fn from_f32_channels(r: f32, g: f32, b: f32) -> Self {
        Self::new(channel_from_f32(r), channel_from_f32(g), channel_from_f32(b))
    }

    /// True when this is the black sentinel
    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }

    /// Scale every channel by `brightness / 255`, rounding to nearest
    pub fn scaled(&self, brightness: u8) -> Self {
        let scale = brightness as f32 / 255.0;
        Self::from_f32_channels(
            self.r as f32 * scale,
            self.g as f32 * scale,
            self.b as f32 * scale,
        )
    }

    /// Channels as an array, in RGB order
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for ZoneColor {
    fn from(value: [u8; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<(u8, u8, u8)> for ZoneColor {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl fmt::Display for ZoneColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Round and clamp a floating point channel into `u8`
pub(crate) fn channel_from_f32(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Left and right zone colors produced from one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZonePair {
    /// Left half of the sampled region
    pub left: ZoneColor,
    /// Right half of the sampled region
    pub right: ZoneColor,
}

impl ZonePair {
    /// Both zones black
    pub const BLACK: Self = Self::new(ZoneColor::BLACK, ZoneColor::BLACK);

    /// Create a pair
    pub const fn new(left: ZoneColor, right: ZoneColor) -> Self {
        Self { left, right }
    }

    /// Same color on both zones
    pub const fn uniform(color: ZoneColor) -> Self {
        Self::new(color, color)
    }

    /// Apply `f` to both zones
    pub fn map(self, mut f: impl FnMut(ZoneColor) -> ZoneColor) -> Self {
        Self::new(f(self.left), f(self.right))
    }
}

/// A pixel with its perceptual weight attached.
///
/// The weight never drops below [`WeightedPixel::MIN_WEIGHT`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPixel {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Perceptual weight
    pub weight: f64,
}

impl WeightedPixel {
    /// Weight floor
    pub const MIN_WEIGHT: f64 = 0.01;

    /// Create a weighted pixel, enforcing the weight floor
    pub fn new(r: u8, g: u8, b: u8, weight: f64) -> Self {
        let weight = if weight.is_nan() {
            Self::MIN_WEIGHT
        } else {
            weight.max(Self::MIN_WEIGHT)
        };
        Self { r, g, b, weight }
    }
}
