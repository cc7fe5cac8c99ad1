//! Animation modes and their per-run smoothed state.
//!
//! Modes are pure state machines: they consume samples and return the
//! [`Emission`] to write, if any. Scheduling and the LED sink live in
//! [`crate::controller`].

use auralight_core::{
    lerp_u8, map_intensity, AnimationParameters, BlendCurve, PerformanceProfile,
    TemporalBlender, ZoneColor, ZonePair,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::sink::ZoneMask;
use crate::ControlError;

/// Shortest fused tick, used when the profile is unthrottled
pub const MIN_FUSED_INTERVAL_MS: u64 = 16;

/// Tick period of the static mode
pub const STATIC_INTERVAL_MS: u64 = 30;

/// Selectable animation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    /// Screen colors, emitted as frames arrive
    #[default]
    FrameDriven,
    /// Screen colors with audio-driven brightness on a fixed clock
    FusedClock,
    /// A single user-chosen color on every zone
    Static,
}

impl ModeKind {
    /// Every mode
    pub const ALL: [ModeKind; 3] = [Self::FrameDriven, Self::FusedClock, Self::Static];

    /// Stable lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::FrameDriven => "frame_driven",
            Self::FusedClock => "fused_clock",
            Self::Static => "static",
        }
    }

    /// Whether this mode consumes screen frames
    pub fn needs_frames(&self) -> bool {
        matches!(self, Self::FrameDriven | Self::FusedClock)
    }

    /// Whether this mode consumes loudness samples
    pub fn needs_audio(&self) -> bool {
        matches!(self, Self::FusedClock)
    }

    /// Tick period under `profile`, `None` for modes without their own clock
    pub fn tick_interval(&self, profile: PerformanceProfile) -> Option<Duration> {
        match self {
            Self::FrameDriven => None,
            Self::FusedClock => Some(Duration::from_millis(
                (profile.interval_ms() as u64).max(MIN_FUSED_INTERVAL_MS),
            )),
            Self::Static => Some(Duration::from_millis(STATIC_INTERVAL_MS)),
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModeKind {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ControlError::InvalidParameter(format!("unknown mode '{}'", s)))
    }
}

/// Smoothed output state owned by one running mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedState {
    /// Current left zone color, before brightness scaling
    pub left: ZoneColor,
    /// Current right zone color, before brightness scaling
    pub right: ZoneColor,
    /// Current brightness
    pub brightness: u8,
    /// Envelope-followed loudness, fused mode only
    pub intensity: f32,
}

impl SmoothedState {
    fn new(color: ZoneColor, brightness: u8) -> Self {
        Self {
            left: color,
            right: color,
            brightness,
            intensity: 0.0,
        }
    }

    fn scaled_pair(&self) -> ZonePair {
        ZonePair::new(
            self.left.scaled(self.brightness),
            self.right.scaled(self.brightness),
        )
    }
}

/// One LED write cycle, colors already brightness scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// Left pair and right pair addressed separately
    Split(ZonePair),
    /// Every zone addressed with one color
    Uniform(ZoneColor),
}

impl Emission {
    /// All zones off, addressed the way `kind` addresses them while running
    pub fn blackout(kind: ModeKind) -> Self {
        match kind {
            ModeKind::FrameDriven | ModeKind::FusedClock => Self::Split(ZonePair::BLACK),
            ModeKind::Static => Self::Uniform(ZoneColor::BLACK),
        }
    }

    /// The sink calls this emission expands to, in order
    pub fn writes(&self) -> Vec<(ZoneColor, ZoneMask)> {
        match *self {
            Self::Split(pair) => vec![(pair.left, ZoneMask::LEFT), (pair.right, ZoneMask::RIGHT)],
            Self::Uniform(color) => vec![(color, ZoneMask::ALL)],
        }
    }
}

/// A running animation with its smoothed state
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationMode {
    /// Blends and emits on every fresh screen sample
    FrameDriven(SmoothedState),
    /// Merges the latest screen and loudness samples on each tick
    FusedClock(SmoothedState),
    /// Eases toward the static color on each tick
    Static {
        /// Smoothed state
        state: SmoothedState,
        /// Last output written, used to skip unchanged writes
        last_output: Option<ZoneColor>,
    },
}

impl AnimationMode {
    /// Fresh state for `kind`
    pub fn new(kind: ModeKind, params: &AnimationParameters) -> Self {
        match kind {
            ModeKind::FrameDriven => Self::FrameDriven(SmoothedState::new(
                ZoneColor::BLACK,
                params.target_brightness(),
            )),
            ModeKind::FusedClock => Self::FusedClock(SmoothedState::new(ZoneColor::BLACK, 0)),
            ModeKind::Static => Self::Static {
                state: SmoothedState::new(params.static_color(), params.target_brightness()),
                last_output: None,
            },
        }
    }

    /// Which mode this is
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::FrameDriven(_) => ModeKind::FrameDriven,
            Self::FusedClock(_) => ModeKind::FusedClock,
            Self::Static { .. } => ModeKind::Static,
        }
    }

    /// Smoothed state
    pub fn state(&self) -> &SmoothedState {
        match self {
            Self::FrameDriven(state) | Self::FusedClock(state) => state,
            Self::Static { state, .. } => state,
        }
    }

    /// Handle a fresh screen sample delivered directly by the frame callback.
    ///
    /// Only the frame-driven mode reacts; clocked modes take samples through
    /// [`AnimationMode::on_tick`].
    pub fn on_colors(&mut self, colors: ZonePair, params: &AnimationParameters) -> Option<Emission> {
        let Self::FrameDriven(state) = self else {
            return None;
        };
        let blender = TemporalBlender::new(params.response());
        blender.step_color(&mut state.left, colors.left);
        blender.step_color(&mut state.right, colors.right);
        blender.step_brightness(
            &mut state.brightness,
            params.target_brightness(),
            BlendCurve::BRIGHTNESS,
        );
        Some(Emission::Split(state.scaled_pair()))
    }

    /// Run one clock tick with whatever samples arrived since the last one.
    ///
    /// The fused mode emits only when a color or loudness update fired. The
    /// static mode emits only when its output changed.
    pub fn on_tick(
        &mut self,
        colors: Option<ZonePair>,
        intensity: Option<f32>,
        params: &AnimationParameters,
    ) -> Option<Emission> {
        let blender = TemporalBlender::new(params.response());
        match self {
            Self::FrameDriven(_) => None,
            Self::FusedClock(state) => {
                let mut updated = false;
                if let Some(colors) = colors {
                    blender.step_color(&mut state.left, colors.left);
                    blender.step_color(&mut state.right, colors.right);
                    updated = true;
                }
                if let Some(raw) = intensity {
                    blender.step_intensity(&mut state.intensity, raw);
                    let mapped = map_intensity(state.intensity, params.sensitivity());
                    let target = (params.target_brightness() as f32 * mapped)
                        .round()
                        .clamp(0.0, 255.0) as u8;
                    blender.step_brightness(
                        &mut state.brightness,
                        target,
                        BlendCurve::BRIGHTNESS_AUDIO,
                    );
                    updated = true;
                }
                updated.then(|| Emission::Split(state.scaled_pair()))
            }
            Self::Static { state, last_output } => {
                let factor = BlendCurve::STATIC.factor(params.response());
                state.left = ease_color(state.left, params.static_color(), factor);
                state.right = state.left;
                state.brightness = lerp_u8(state.brightness, params.target_brightness(), factor);
                let output = state.left.scaled(state.brightness);
                if *last_output == Some(output) {
                    return None;
                }
                *last_output = Some(output);
                Some(Emission::Uniform(output))
            }
        }
    }
}

/// Per-channel easing without the black snap: a black static color fades out
fn ease_color(current: ZoneColor, target: ZoneColor, factor: f32) -> ZoneColor {
    ZoneColor::new(
        lerp_u8(current.r, target.r, factor),
        lerp_u8(current.g, target.g, factor),
        lerp_u8(current.b, target.b, factor),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(response: f32) -> AnimationParameters {
        let mut params = AnimationParameters::default();
        params.set_response(response);
        params
    }

    #[test]
    fn test_tick_intervals() {
        assert_eq!(ModeKind::FrameDriven.tick_interval(PerformanceProfile::High), None);
        assert_eq!(
            ModeKind::FusedClock.tick_interval(PerformanceProfile::Ragnarok),
            Some(Duration::from_millis(16))
        );
        assert_eq!(
            ModeKind::FusedClock.tick_interval(PerformanceProfile::Low),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            ModeKind::Static.tick_interval(PerformanceProfile::Low),
            Some(Duration::from_millis(30))
        );
    }

    #[test]
    fn test_mode_names_parse() {
        for kind in ModeKind::ALL {
            assert_eq!(kind.name().parse::<ModeKind>().unwrap(), kind);
        }
        assert_eq!("fused-clock".parse::<ModeKind>().unwrap(), ModeKind::FusedClock);
        assert!("disco".parse::<ModeKind>().is_err());
    }

    #[test]
    fn test_frame_driven_full_response_reaches_target() {
        let params = params(1.0);
        let mut mode = AnimationMode::new(ModeKind::FrameDriven, &params);
        let colors = ZonePair::new(ZoneColor::new(200, 0, 0), ZoneColor::new(0, 0, 200));

        let emission = mode.on_colors(colors, &params).unwrap();
        // factor 0.9 from black: 180
        assert_eq!(
            emission,
            Emission::Split(ZonePair::new(
                ZoneColor::new(180, 0, 0),
                ZoneColor::new(0, 0, 180)
            ))
        );
    }

    #[test]
    fn test_frame_driven_black_snaps() {
        let params = params(0.0);
        let mut mode = AnimationMode::new(ModeKind::FrameDriven, &params);
        let lit = ZonePair::uniform(ZoneColor::new(250, 250, 250));
        for _ in 0..20 {
            mode.on_colors(lit, &params);
        }
        assert!(!mode.state().left.is_black());

        let emission = mode
            .on_colors(ZonePair::new(ZoneColor::BLACK, ZoneColor::new(250, 250, 250)), &params)
            .unwrap();
        let Emission::Split(pair) = emission else {
            panic!("expected split emission");
        };
        assert!(pair.left.is_black());
        assert!(!pair.right.is_black());
    }

    #[test]
    fn test_frame_driven_ignores_ticks() {
        let params = params(0.5);
        let mut mode = AnimationMode::new(ModeKind::FrameDriven, &params);
        assert!(mode
            .on_tick(Some(ZonePair::uniform(ZoneColor::WHITE)), Some(1.0), &params)
            .is_none());
    }

    #[test]
    fn test_fused_tick_without_samples_is_silent() {
        let params = params(0.5);
        let mut mode = AnimationMode::new(ModeKind::FusedClock, &params);
        assert!(mode.on_tick(None, None, &params).is_none());
        assert!(mode.on_colors(ZonePair::uniform(ZoneColor::WHITE), &params).is_none());
    }

    #[test]
    fn test_fused_color_only_stays_dark_until_audio() {
        let params = params(1.0);
        let mut mode = AnimationMode::new(ModeKind::FusedClock, &params);
        let emission = mode
            .on_tick(Some(ZonePair::uniform(ZoneColor::new(200, 100, 0))), None, &params)
            .unwrap();
        assert_eq!(emission, Emission::Split(ZonePair::BLACK));
        assert_eq!(mode.state().left, ZoneColor::new(180, 90, 0));

        let emission = mode.on_tick(None, Some(1.0), &params).unwrap();
        let Emission::Split(pair) = emission else {
            panic!("expected split emission");
        };
        assert!(!pair.left.is_black());
        assert!(mode.state().intensity > 0.8);
    }

    #[test]
    fn test_fused_silence_keeps_brightness_down() {
        let params = params(0.5);
        let mut mode = AnimationMode::new(ModeKind::FusedClock, &params);
        mode.on_tick(Some(ZonePair::uniform(ZoneColor::WHITE)), Some(0.1), &params);
        assert_eq!(mode.state().brightness, 0);
    }

    #[test]
    fn test_static_converges_then_goes_quiet() {
        let mut params = params(1.0);
        params.set_static_color(ZoneColor::new(0, 255, 0));
        let mut mode = AnimationMode::new(ModeKind::Static, &params);

        let first = mode.on_tick(None, None, &params);
        assert_eq!(first, Some(Emission::Uniform(ZoneColor::new(0, 255, 0))));
        assert!(mode.on_tick(None, None, &params).is_none());

        params.set_static_color(ZoneColor::new(255, 0, 0));
        let next = mode.on_tick(None, None, &params).unwrap();
        let Emission::Uniform(color) = next else {
            panic!("expected uniform emission");
        };
        assert!(color.r > 0 && color.g > 0);
    }

    proptest::proptest! {
        #[test]
        fn prop_fused_tick_without_samples_never_emits(
            response in 0.0f32..=1.0,
            sensitivity in 0.0f32..=1.0,
            brightness in 0i32..=255,
        ) {
            let mut params = params(response);
            params.set_sensitivity(sensitivity);
            params.set_target_brightness(brightness);
            let mut mode = AnimationMode::new(ModeKind::FusedClock, &params);
            mode.on_tick(Some(ZonePair::uniform(ZoneColor::WHITE)), Some(0.8), &params);
            proptest::prop_assert!(mode.on_tick(None, None, &params).is_none());
        }

        #[test]
        fn prop_frame_driven_moves_toward_target(
            response in 0.0f32..=1.0,
            start in proptest::array::uniform3(1u8..=255),
            target in proptest::array::uniform3(1u8..=255),
        ) {
            let params = params(response);
            let mut mode = AnimationMode::new(ModeKind::FrameDriven, &params);
            mode.on_colors(ZonePair::uniform(ZoneColor::from(start)), &params);
            let before = mode.state().left;
            mode.on_colors(ZonePair::uniform(ZoneColor::from(target)), &params);
            let after = mode.state().left;
            for ((b, a), t) in before.channels().iter().zip(after.channels()).zip(target) {
                proptest::prop_assert!(a >= (*b).min(t) && a <= (*b).max(t));
            }
        }
    }

    #[test]
    fn test_emission_writes() {
        let pair = ZonePair::new(ZoneColor::new(1, 2, 3), ZoneColor::new(4, 5, 6));
        assert_eq!(
            Emission::Split(pair).writes(),
            vec![
                (ZoneColor::new(1, 2, 3), ZoneMask::LEFT),
                (ZoneColor::new(4, 5, 6), ZoneMask::RIGHT)
            ]
        );
    }

    #[test]
    fn test_blackout_follows_mode_addressing() {
        assert_eq!(
            Emission::blackout(ModeKind::FrameDriven).writes(),
            vec![(ZoneColor::BLACK, ZoneMask::LEFT), (ZoneColor::BLACK, ZoneMask::RIGHT)]
        );
        assert_eq!(
            Emission::blackout(ModeKind::FusedClock),
            Emission::Split(ZonePair::BLACK)
        );
        assert_eq!(
            Emission::blackout(ModeKind::Static).writes(),
            vec![(ZoneColor::BLACK, ZoneMask::ALL)]
        );
    }
}
