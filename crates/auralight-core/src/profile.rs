//! Performance profiles and frame throttling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::CoreError;

/// Named processing-rate policy.
///
/// Each profile sets the minimum interval between two processed frames.
/// [`PerformanceProfile::Ragnarok`] processes every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceProfile {
    /// ~10 updates per second
    Low,
    /// ~20 updates per second
    Medium,
    /// ~30 updates per second
    #[default]
    High,
    /// Unthrottled
    Ragnarok,
}

impl PerformanceProfile {
    /// Every profile, slowest first
    pub const ALL: [PerformanceProfile; 4] = [Self::Low, Self::Medium, Self::High, Self::Ragnarok];

    /// Minimum milliseconds between processed frames, 0 means every frame
    pub const fn interval_ms(&self) -> u32 {
        match self {
            Self::Low => 100,
            Self::Medium => 50,
            Self::High => 33,
            Self::Ragnarok => 0,
        }
    }

    /// [`Self::interval_ms`] as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms() as u64)
    }

    /// True when no throttling applies
    pub fn is_unthrottled(&self) -> bool {
        self.interval_ms() == 0
    }

    /// Stable lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ragnarok => "ragnarok",
        }
    }
}

impl fmt::Display for PerformanceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PerformanceProfile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownProfile(s.to_string()))
    }
}

/// Rate limiter gating frame processing by a [`PerformanceProfile`]
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    profile: PerformanceProfile,
    last_processed: Option<Instant>,
}

impl FrameThrottle {
    /// Create a throttle for `profile`
    pub fn new(profile: PerformanceProfile) -> Self {
        Self {
            profile,
            last_processed: None,
        }
    }

    /// Active profile
    pub fn profile(&self) -> PerformanceProfile {
        self.profile
    }

    /// Swap the profile, keeping the last processed timestamp
    pub fn set_profile(&mut self, profile: PerformanceProfile) {
        self.profile = profile;
    }

    /// Returns true and records `now` if a frame arriving at `now` should be
    /// processed.
    pub fn admit(&mut self, now: Instant) -> bool {
        let admitted = self.profile.is_unthrottled()
            || self.last_processed.map_or(true, |last| {
                now.saturating_duration_since(last) >= self.profile.interval()
            });
        if admitted {
            self.last_processed = Some(now);
        }
        admitted
    }

    /// Forget the last processed timestamp
    pub fn reset(&mut self) {
        self.last_processed = None;
    }
}
