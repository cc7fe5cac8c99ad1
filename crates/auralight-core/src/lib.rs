//! Auralight Core - Color extraction and temporal blending
//!
//! This crate contains the numeric heart of Auralight:
//! - Frame views and zone color types
//! - Perceptually weighted color extraction
//! - HSV saturation boost
//! - Asymmetric exponential smoothing of colors, brightness and loudness
//! - Performance profiles and frame throttling
//!
//! It owns no threads. Scheduling lives in `auralight-control`.

#![warn(missing_docs)]

use thiserror::Error;

pub mod analyzer;
pub mod blend;
pub mod color;
pub mod extractor;
pub mod frame;
pub mod logging;
pub mod params;
pub mod profile;
pub mod saturation;

// --- Re-exports grouped by category ---

// Color & frames
pub use color::{WeightedPixel, ZoneColor, ZonePair};
pub use frame::{FrameBuffer, OwnedFrame, BYTES_PER_PIXEL};

// Extraction
pub use analyzer::FrameAnalyzer;
pub use extractor::{
    dense_grid_height, pixel_weight, top_percentile_count, weighted_top_average, CaptureSize,
    ColorExtractor, DEFAULT_TOP_FRACTION, DENSE_CAPTURE_WIDTH,
};
pub use saturation::{boost_saturation, SaturationBooster};

// Blending
pub use blend::{
    blend_color, lerp_f32, lerp_u8, map_intensity, noise_floor, sanitize_intensity, BlendCurve,
    TemporalBlender,
};

// Parameters & profiles
pub use params::{AnimationParameters, SamplingMode};
pub use profile::{FrameThrottle, PerformanceProfile};

// Logging
pub use logging::LogConfig;

/// Core error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Frame geometry does not fit the pixel data
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// No performance profile with this name
    #[error("Unknown performance profile: {0}")]
    UnknownProfile(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
