//! LED sink that reports writes through `tracing`.
//!
//! Stands in for the strip transport: each write is logged at debug level
//! and the last color per physical zone is kept for status lines.

use auralight_control::{LedSink, Result, ZoneMask};
use auralight_core::ZoneColor;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Last color of each physical zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StripState {
    /// Left side, upper segment
    pub left_top: ZoneColor,
    /// Left side, lower segment
    pub left_bottom: ZoneColor,
    /// Right side, upper segment
    pub right_top: ZoneColor,
    /// Right side, lower segment
    pub right_bottom: ZoneColor,
}

impl StripState {
    /// Apply one write
    pub fn apply(&mut self, color: ZoneColor, zones: ZoneMask) {
        if zones.left_top {
            self.left_top = color;
        }
        if zones.left_bottom {
            self.left_bottom = color;
        }
        if zones.right_top {
            self.right_top = color;
        }
        if zones.right_bottom {
            self.right_bottom = color;
        }
    }

    /// True when every zone is off
    pub fn is_dark(&self) -> bool {
        [
            self.left_top,
            self.left_bottom,
            self.right_top,
            self.right_bottom,
        ]
        .iter()
        .all(ZoneColor::is_black)
    }
}

impl fmt::Display for StripState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LT {} LB {} RT {} RB {}",
            self.left_top, self.left_bottom, self.right_top, self.right_bottom
        )
    }
}

/// Logs every write and tracks the strip state
#[derive(Debug, Default)]
pub struct TracingLedSink {
    state: Mutex<StripState>,
    writes: AtomicU64,
}

impl TracingLedSink {
    /// Create a sink with every zone off
    pub fn new() -> Self {
        Self::default()
    }

    /// Current strip state
    pub fn state(&self) -> StripState {
        *self.state.lock()
    }

    /// Writes received so far
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl LedSink for TracingLedSink {
    fn set_color(&self, color: ZoneColor, zones: ZoneMask) -> Result<()> {
        if zones.is_empty() {
            return Ok(());
        }
        self.state.lock().apply(color, zones);
        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(zones = %zones, color = %color, "LED write");
        Ok(())
    }
}
