//! LED output contract.
//!
//! A 4-zone strip is addressed through one primitive: an RGB triple plus the
//! set of physical zones it applies to. Addressing one, two or four zones
//! per call lets the strip act as 1, 2 or 4 independently colored segments.

use auralight_core::ZoneColor;
use std::fmt;

use crate::Result;

/// Physical zones addressed by one LED write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ZoneMask {
    /// Left side, upper segment
    pub left_top: bool,
    /// Left side, lower segment
    pub left_bottom: bool,
    /// Right side, upper segment
    pub right_top: bool,
    /// Right side, lower segment
    pub right_bottom: bool,
}

impl ZoneMask {
    /// Both left segments
    pub const LEFT: Self = Self {
        left_top: true,
        left_bottom: true,
        right_top: false,
        right_bottom: false,
    };

    /// Both right segments
    pub const RIGHT: Self = Self {
        left_top: false,
        left_bottom: false,
        right_top: true,
        right_bottom: true,
    };

    /// Every segment
    pub const ALL: Self = Self {
        left_top: true,
        left_bottom: true,
        right_top: true,
        right_bottom: true,
    };

    /// True when no zone is addressed
    pub fn is_empty(&self) -> bool {
        !(self.left_top || self.left_bottom || self.right_top || self.right_bottom)
    }
}

impl fmt::Display for ZoneMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(
            f,
            "{}{}{}{}",
            flag(self.left_top, 'L'),
            flag(self.left_bottom, 'l'),
            flag(self.right_top, 'R'),
            flag(self.right_bottom, 'r')
        )
    }
}

/// Hardware (or simulated) LED output.
///
/// Called from the frame callback context and the controller's tick thread,
/// so implementations must be thread safe and should return promptly.
pub trait LedSink: Send + Sync {
    /// Set `zones` to `color`. The color is already brightness scaled.
    fn set_color(&self, color: ZoneColor, zones: ZoneMask) -> Result<()>;
}

impl<T: LedSink + ?Sized> LedSink for std::sync::Arc<T> {
    fn set_color(&self, color: ZoneColor, zones: ZoneMask) -> Result<()> {
        (**self).set_color(color, zones)
    }
}
