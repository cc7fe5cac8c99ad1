//! Frame-callback stage: throttle, extract, boost, deduplicate.

use std::time::Instant;

use tracing::trace;

use crate::color::ZonePair;
use crate::extractor::ColorExtractor;
use crate::frame::FrameBuffer;
use crate::params::AnimationParameters;
use crate::profile::{FrameThrottle, PerformanceProfile};
use crate::saturation::SaturationBooster;

/// Runs on the frame source's callback context and turns frames into fresh
/// zone samples.
///
/// Only returns a sample when the throttle admits the frame and the boosted
/// colors differ from the last sample returned.
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    throttle: FrameThrottle,
    last_emitted: Option<ZonePair>,
    processed_frames: u64,
    skipped_frames: u64,
}

impl FrameAnalyzer {
    /// Create an analyzer throttled by `profile`
    pub fn new(profile: PerformanceProfile) -> Self {
        Self {
            throttle: FrameThrottle::new(profile),
            last_emitted: None,
            processed_frames: 0,
            skipped_frames: 0,
        }
    }

    /// Active profile
    pub fn profile(&self) -> PerformanceProfile {
        self.throttle.profile()
    }

    /// Change the throttling profile
    pub fn set_profile(&mut self, profile: PerformanceProfile) {
        self.throttle.set_profile(profile);
    }

    /// Process one frame arriving at `now`
    pub fn analyze(
        &mut self,
        frame: &FrameBuffer<'_>,
        now: Instant,
        params: &AnimationParameters,
    ) -> Option<ZonePair> {
        if !self.throttle.admit(now) {
            self.skipped_frames += 1;
            return None;
        }
        self.processed_frames += 1;

        let booster = SaturationBooster::new(params.saturation_boost());
        let colors = ColorExtractor::from_params(params)
            .extract(frame)
            .map(|c| booster.boost(c));

        if self.last_emitted == Some(colors) {
            trace!("Frame colors unchanged, skipping");
            return None;
        }
        self.last_emitted = Some(colors);
        Some(colors)
    }

    /// Forget throttle and dedup state
    pub fn reset(&mut self) {
        self.throttle.reset();
        self.last_emitted = None;
    }

    /// Frames that passed the throttle
    pub fn processed_frames(&self) -> u64 {
        self.processed_frames
    }

    /// Frames dropped by the throttle
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }
}
