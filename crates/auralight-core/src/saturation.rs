//! HSV saturation boost applied to extracted zone colors.

use palette::{FromColor, Hsv, Srgb};

use crate::color::ZoneColor;

/// Multiplier applied to saturation at a boost factor of 1.0
const MAX_EXTRA_SATURATION: f32 = 2.5;

/// Boosts HSV saturation by `1 + 2.5 * factor`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SaturationBooster {
    factor: f32,
}

impl SaturationBooster {
    /// Create a booster, `factor` is clamped to `0.0..=1.0`
    pub fn new(factor: f32) -> Self {
        let factor = if factor.is_nan() {
            0.0
        } else {
            factor.clamp(0.0, 1.0)
        };
        Self { factor }
    }

    /// Saturation multiplier in `1.0..=3.5`
    pub fn multiplier(&self) -> f32 {
        1.0 + self.factor * MAX_EXTRA_SATURATION
    }

    /// Boost `color`. Hue and value are preserved up to rounding.
    pub fn boost(&self, color: ZoneColor) -> ZoneColor {
        let multiplier = self.multiplier();
        if multiplier == 1.0 {
            return color;
        }

        let rgb = Srgb::new(
            color.r as f32 / 255.0,
            color.g as f32 / 255.0,
            color.b as f32 / 255.0,
        );
        let mut hsv: Hsv = Hsv::from_color(rgb);
        hsv.saturation = (hsv.saturation * multiplier).clamp(0.0, 1.0);
        let out: Srgb = Srgb::from_color(hsv);

        ZoneColor::from_f32_channels(out.red * 255.0, out.green * 255.0, out.blue * 255.0)
    }
}

/// Boost `color` by `factor` in `0.0..=1.0`
pub fn boost_saturation(color: ZoneColor, factor: f32) -> ZoneColor {
    SaturationBooster::new(factor).boost(color)
}
