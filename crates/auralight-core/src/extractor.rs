//! Zone color extraction from captured frames.
//!
//! Two sampling strategies are supported:
//!
//! - **Point probe**: the capture is a 2x1 surface; the left zone is the
//!   pixel at column 0 and the right zone the pixel at column 1.
//! - **Dense**: the capture is downsampled to a 32-column grid whose height
//!   follows the source aspect ratio. Every pixel gets a perceptual weight
//!   (brightness compression, saturation, colorfulness), only the top
//!   fraction by weight is kept, and the zone color is their weighted mean.
//!   Restricting to the most vivid pixels keeps large dim backgrounds from
//!   washing the result toward grey.

use std::cmp::Ordering;

use crate::color::{WeightedPixel, ZoneColor, ZonePair};
use crate::frame::{FrameBuffer, OwnedFrame};
use crate::params::{AnimationParameters, SamplingMode};

/// Column count of the dense sampling grid
pub const DENSE_CAPTURE_WIDTH: u32 = 32;

/// Default share of pixels kept by top-percentile selection
pub const DEFAULT_TOP_FRACTION: f32 = 0.3;

const POINT_PROBE_WIDTH: u32 = 2;

/// Size of the capture surface requested from a frame source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl CaptureSize {
    /// Capture size for a display of `width`x`height` under `sampling`.
    ///
    /// Dense sampling keeps the display aspect ratio with a floor of one row.
    pub fn for_display(width: u32, height: u32, sampling: SamplingMode) -> Self {
        match sampling {
            SamplingMode::PointProbe => Self {
                width: POINT_PROBE_WIDTH,
                height: 1,
            },
            SamplingMode::Dense => Self {
                width: DENSE_CAPTURE_WIDTH,
                height: dense_grid_height(width, height),
            },
        }
    }
}

/// `round(32 * height / width)`, at least 1
pub fn dense_grid_height(source_width: u32, source_height: u32) -> u32 {
    if source_width == 0 {
        return 1;
    }
    let height =
        (DENSE_CAPTURE_WIDTH as f64 * source_height as f64 / source_width as f64).round() as u32;
    height.max(1)
}

/// Perceptual weight of one pixel.
///
/// Combines a brightness compression curve that suppresses near-black
/// pixels, a saturation term and a colorfulness term. Never below
/// [`WeightedPixel::MIN_WEIGHT`].
pub fn pixel_weight(r: u8, g: u8, b: u8) -> f64 {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let brightness = 0.299 * r + 0.587 * g + 0.114 * b;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let saturation = if max == 0.0 { 0.0 } else { (max - min) / max };

    let mean = (r + g + b) / 3.0;
    let colorfulness =
        (((r - mean).powi(2) + (g - mean).powi(2) + (b - mean).powi(2)) / 3.0).sqrt();

    let brightness_weight = 1.0 - 1.0 / (1.0 + (brightness * 10.0).powi(2));
    let saturation_weight = saturation.powf(0.3) * 4.0;
    let colorfulness_weight = colorfulness * 5.0;

    (0.15 * brightness_weight + 0.55 * saturation_weight + 0.3 * colorfulness_weight)
        .max(WeightedPixel::MIN_WEIGHT)
}

/// Number of pixels kept out of `total` for `fraction`, rounded down with a
/// minimum of one. Zero only when `total` is zero.
pub fn top_percentile_count(total: usize, fraction: f32) -> usize {
    if total == 0 {
        return 0;
    }
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0) as f64
    };
    // Nudge so 10 * 0.3 lands on 3 despite f32 representation error
    let kept = (total as f64 * fraction + 1e-6).floor() as usize;
    kept.clamp(1, total)
}

/// Weighted mean of the top `fraction` of `pixels` by weight.
///
/// Sorts `pixels` in place, descending by weight. Returns black for an
/// empty slice or a zero weight sum.
pub fn weighted_top_average(pixels: &mut [WeightedPixel], fraction: f32) -> ZoneColor {
    let kept = top_percentile_count(pixels.len(), fraction);
    if kept == 0 {
        return ZoneColor::BLACK;
    }

    pixels.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));

    let (mut r, mut g, mut b, mut total) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for px in &pixels[..kept] {
        r += px.r as f64 * px.weight;
        g += px.g as f64 * px.weight;
        b += px.b as f64 * px.weight;
        total += px.weight;
    }

    if total <= 0.0 {
        return ZoneColor::BLACK;
    }

    ZoneColor::from_f32_channels((r / total) as f32, (g / total) as f32, (b / total) as f32)
}

/// Turns a captured frame into a left/right [`ZonePair`]
#[derive(Debug, Clone, PartialEq)]
pub struct ColorExtractor {
    sampling: SamplingMode,
    top_fraction: f32,
    single_color: bool,
}

impl Default for ColorExtractor {
    fn default() -> Self {
        Self::new(SamplingMode::PointProbe)
    }
}

impl ColorExtractor {
    /// Create an extractor with the default top fraction
    pub fn new(sampling: SamplingMode) -> Self {
        Self {
            sampling,
            top_fraction: DEFAULT_TOP_FRACTION,
            single_color: false,
        }
    }

    /// Create an extractor matching `params`
    pub fn from_params(params: &AnimationParameters) -> Self {
        Self {
            sampling: params.sampling(),
            top_fraction: params.top_fraction(),
            single_color: params.single_color(),
        }
    }

    /// Override the retained fraction for dense sampling
    pub fn with_top_fraction(mut self, fraction: f32) -> Self {
        self.top_fraction = fraction;
        self
    }

    /// Report one color for both zones
    pub fn with_single_color(mut self, single: bool) -> Self {
        self.single_color = single;
        self
    }

    /// Sampling mode in use
    pub fn sampling(&self) -> SamplingMode {
        self.sampling
    }

    /// Extract the zone colors of `frame`. An empty frame yields black.
    pub fn extract(&self, frame: &FrameBuffer<'_>) -> ZonePair {
        if frame.is_empty() {
            return ZonePair::BLACK;
        }
        match self.sampling {
            SamplingMode::PointProbe => {
                if frame.width() > 2 || frame.height() > 1 {
                    let probe = OwnedFrame::resampled(frame, 2, 1);
                    self.extract_point_probe(&probe.as_buffer())
                } else {
                    self.extract_point_probe(frame)
                }
            }
            SamplingMode::Dense => {
                if frame.width() > DENSE_CAPTURE_WIDTH {
                    let grid = OwnedFrame::resampled(
                        frame,
                        DENSE_CAPTURE_WIDTH,
                        dense_grid_height(frame.width(), frame.height()),
                    );
                    self.extract_dense(&grid.as_buffer())
                } else {
                    self.extract_dense(frame)
                }
            }
        }
    }

    fn extract_point_probe(&self, frame: &FrameBuffer<'_>) -> ZonePair {
        let left = frame.pixel(0, 0).map(ZoneColor::from).unwrap_or_default();
        let right = frame.pixel(1, 0).map(ZoneColor::from).unwrap_or_default();
        if self.single_color {
            let mean = |a: u8, b: u8| ((a as u16 + b as u16 + 1) / 2) as u8;
            return ZonePair::uniform(ZoneColor::new(
                mean(left.r, right.r),
                mean(left.g, right.g),
                mean(left.b, right.b),
            ));
        }
        ZonePair::new(left, right)
    }

    fn extract_dense(&self, frame: &FrameBuffer<'_>) -> ZonePair {
        if self.single_color {
            let color = self.region_color(frame, 0, frame.width());
            return ZonePair::uniform(color);
        }
        let mid = frame.width() / 2;
        ZonePair::new(
            self.region_color(frame, 0, mid),
            self.region_color(frame, mid, frame.width()),
        )
    }

    /// Weighted color of the columns `start..end` across every row
    fn region_color(&self, frame: &FrameBuffer<'_>, start: u32, end: u32) -> ZoneColor {
        let mut pixels = Vec::with_capacity((end.saturating_sub(start) * frame.height()) as usize);
        for y in 0..frame.height() {
            for x in start..end {
                if let Some([r, g, b]) = frame.pixel(x, y) {
                    pixels.push(WeightedPixel::new(r, g, b, pixel_weight(r, g, b)));
                }
            }
        }
        weighted_top_average(&mut pixels, self.top_fraction)
    }
}
