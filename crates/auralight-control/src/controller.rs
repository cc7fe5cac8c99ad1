//! Animation controller: lifecycle, scheduling and LED emission.
//!
//! Three contexts touch a running controller: the frame source callback,
//! the audio source callback and, for clocked modes, the controller's own
//! tick thread. Every emission happens under the core lock after checking
//! that the session which produced it is still live, so nothing reaches the
//! sink after [`AnimationController::stop`] returns except its black write.

use auralight_core::{
    AnimationParameters, CaptureSize, FrameAnalyzer, FrameBuffer, PerformanceProfile, SamplingMode,
    ZoneColor, ZonePair,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::mode::{AnimationMode, Emission, ModeKind, SmoothedState};
use crate::sink::LedSink;
use crate::slot::PendingSlot;
use crate::source::{frame_callback, AudioIntensitySource, FrameSource, IntensityCallback};
use crate::ticker::Ticker;
use crate::{ControlError, Result};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// No session, nothing is emitted
    Stopped,
    /// Sources open and emitting
    Running,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::Running => f.write_str("running"),
        }
    }
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Successful sink writes
    pub sink_writes: u64,
    /// Sink writes that returned an error
    pub sink_errors: u64,
    /// Frames that passed the profile throttle
    pub processed_frames: u64,
    /// Frames dropped by the profile throttle
    pub skipped_frames: u64,
    /// Screen samples replaced before a tick consumed them
    pub overwritten_colors: u64,
    /// Loudness samples replaced before a tick consumed them
    pub overwritten_intensities: u64,
}

struct Core {
    state: ControllerState,
    generation: u64,
    /// Bumped on every frame capture open, so a reopened capture drops
    /// frames still in flight from the previous one
    frame_session: u64,
    kind: ModeKind,
    profile: PerformanceProfile,
    mode: Option<AnimationMode>,
    ticker: Option<Ticker>,
    frame_source: Option<Box<dyn FrameSource>>,
    audio_source: Option<Box<dyn AudioIntensitySource>>,
    frame_open: bool,
    audio_open: bool,
}

impl Core {
    fn is_live(&self, generation: u64) -> bool {
        self.state == ControllerState::Running && self.generation == generation
    }

    fn is_frame_live(&self, generation: u64, session: u64) -> bool {
        self.is_live(generation) && self.frame_session == session
    }
}

struct Shared {
    core: Mutex<Core>,
    /// Generation of the running session, 0 while stopped
    live_generation: AtomicU64,
    live_frame_session: AtomicU64,
    params: RwLock<AnimationParameters>,
    analyzer: Mutex<FrameAnalyzer>,
    pending_colors: PendingSlot<ZonePair>,
    pending_intensity: PendingSlot<f32>,
    sink: Arc<dyn LedSink>,
    sink_writes: AtomicU64,
    sink_errors: AtomicU64,
}

/// Drives an [`LedSink`] from screen and loudness sources.
///
/// Mode, profile and parameters can change at any time. Dropping a running
/// controller stops it.
pub struct AnimationController {
    shared: Arc<Shared>,
}

impl AnimationController {
    /// Create a stopped controller writing to `sink`
    pub fn new(sink: impl LedSink + 'static) -> Self {
        let profile = PerformanceProfile::default();
        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    state: ControllerState::Stopped,
                    generation: 0,
                    frame_session: 0,
                    kind: ModeKind::default(),
                    profile,
                    mode: None,
                    ticker: None,
                    frame_source: None,
                    audio_source: None,
                    frame_open: false,
                    audio_open: false,
                }),
                live_generation: AtomicU64::new(0),
                live_frame_session: AtomicU64::new(0),
                params: RwLock::new(AnimationParameters::default()),
                analyzer: Mutex::new(FrameAnalyzer::new(profile)),
                pending_colors: PendingSlot::new(),
                pending_intensity: PendingSlot::new(),
                sink: Arc::new(sink),
                sink_writes: AtomicU64::new(0),
                sink_errors: AtomicU64::new(0),
            }),
        }
    }

    /// Use `source` for screen frames
    pub fn with_frame_source(self, source: impl FrameSource + 'static) -> Self {
        self.shared.core.lock().frame_source = Some(Box::new(source));
        self
    }

    /// Use `source` for loudness samples
    pub fn with_audio_source(self, source: impl AudioIntensitySource + 'static) -> Self {
        self.shared.core.lock().audio_source = Some(Box::new(source));
        self
    }

    /// Select the mode used by the next start
    pub fn with_mode(self, kind: ModeKind) -> Self {
        self.shared.core.lock().kind = kind;
        self
    }

    /// Select the performance profile
    pub fn with_profile(self, profile: PerformanceProfile) -> Self {
        self.set_profile(profile);
        self
    }

    /// Replace all animation parameters
    pub fn with_parameters(self, params: AnimationParameters) -> Self {
        *self.shared.params.write() = params.normalized();
        self
    }

    /// Open the sources the current mode needs and begin emitting.
    ///
    /// No-op when already running. On failure the controller stays stopped
    /// and nothing is emitted.
    pub fn start(&self) -> Result<()> {
        let mut core = self.shared.core.lock();
        self.shared.start_locked(&mut core)
    }

    /// Stop emitting, release the sources and write black to every zone.
    ///
    /// No-op when already stopped.
    pub fn stop(&self) {
        let ticker = {
            let mut core = self.shared.core.lock();
            self.shared.stop_locked(&mut core)
        };
        if let Some(ticker) = ticker {
            ticker.join();
        }
    }

    /// Lifecycle state
    pub fn state(&self) -> ControllerState {
        self.shared.core.lock().state
    }

    /// True while running
    pub fn is_running(&self) -> bool {
        self.state() == ControllerState::Running
    }

    /// Selected mode
    pub fn mode(&self) -> ModeKind {
        self.shared.core.lock().kind
    }

    /// Change mode. A running controller is stopped, including its black
    /// write, and restarted in the new mode.
    pub fn switch_mode(&self, kind: ModeKind) -> Result<()> {
        let (ticker, result) = {
            let mut core = self.shared.core.lock();
            if core.kind == kind {
                return Ok(());
            }
            let was_running = core.state == ControllerState::Running;
            let ticker = self.shared.stop_locked(&mut core);
            info!("Switching mode {} -> {}", core.kind, kind);
            core.kind = kind;
            let result = if was_running {
                self.shared.start_locked(&mut core)
            } else {
                Ok(())
            };
            (ticker, result)
        };
        if let Some(ticker) = ticker {
            ticker.join();
        }
        result
    }

    /// Active performance profile
    pub fn profile(&self) -> PerformanceProfile {
        self.shared.core.lock().profile
    }

    /// Change the performance profile. Takes effect on the next frame and
    /// the next tick.
    pub fn set_profile(&self, profile: PerformanceProfile) {
        let mut core = self.shared.core.lock();
        core.profile = profile;
        self.shared.analyzer.lock().set_profile(profile);
        debug!("Performance profile set to {}", profile);
    }

    /// Snapshot of the animation parameters
    pub fn parameters(&self) -> AnimationParameters {
        self.shared.params.read().clone()
    }

    /// Replace all animation parameters. Capture is reopened if the sampling
    /// geometry changed, and the analyzer is reset if single-color output
    /// was toggled.
    pub fn set_parameters(&self, params: AnimationParameters) -> Result<()> {
        let params = params.normalized();
        let previous = std::mem::replace(&mut *self.shared.params.write(), params.clone());
        if previous.sampling() != params.sampling() {
            return self.shared.reopen_frames();
        }
        if previous.single_color() != params.single_color() {
            self.shared.analyzer.lock().reset();
        }
        Ok(())
    }

    /// Set blend aggressiveness, clamped to `0.0..=1.0`
    pub fn set_response(&self, response: f32) {
        self.shared.params.write().set_response(response);
    }

    /// Set audio sensitivity, clamped to `0.0..=1.0`
    pub fn set_sensitivity(&self, sensitivity: f32) {
        self.shared.params.write().set_sensitivity(sensitivity);
    }

    /// Set the saturation boost, clamped to `0.0..=1.0`
    pub fn set_saturation_boost(&self, boost: f32) {
        self.shared.params.write().set_saturation_boost(boost);
    }

    /// Set the target brightness, clamped to `0..=255`
    pub fn set_target_brightness(&self, brightness: i32) {
        self.shared.params.write().set_target_brightness(brightness);
    }

    /// Set the static mode color
    pub fn set_static_color(&self, color: ZoneColor) {
        self.shared.params.write().set_static_color(color);
    }

    /// Set the dense sampling retained fraction
    pub fn set_top_fraction(&self, fraction: f32) {
        self.shared.params.write().set_top_fraction(fraction);
    }

    /// Toggle dense sampling. A running capture is reopened at the new size.
    pub fn set_dense_sampling(&self, dense: bool) -> Result<()> {
        let sampling = if dense {
            SamplingMode::Dense
        } else {
            SamplingMode::PointProbe
        };
        {
            let mut params = self.shared.params.write();
            if params.sampling() == sampling {
                return Ok(());
            }
            params.set_sampling(sampling);
        }
        self.shared.reopen_frames()
    }

    /// Toggle single-color output
    pub fn set_single_color(&self, single: bool) {
        self.shared.params.write().set_single_color(single);
        self.shared.analyzer.lock().reset();
    }

    /// Smoothed state of the running mode
    pub fn smoothed_state(&self) -> Option<SmoothedState> {
        self.shared
            .core
            .lock()
            .mode
            .as_ref()
            .map(|mode| *mode.state())
    }

    /// Diagnostic counters
    pub fn stats(&self) -> ControllerStats {
        let analyzer = self.shared.analyzer.lock();
        ControllerStats {
            sink_writes: self.shared.sink_writes.load(Ordering::Relaxed),
            sink_errors: self.shared.sink_errors.load(Ordering::Relaxed),
            processed_frames: analyzer.processed_frames(),
            skipped_frames: analyzer.skipped_frames(),
            overwritten_colors: self.shared.pending_colors.overwritten(),
            overwritten_intensities: self.shared.pending_intensity.overwritten(),
        }
    }
}

impl Drop for AnimationController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.core.lock();
        f.debug_struct("AnimationController")
            .field("state", &core.state)
            .field("mode", &core.kind)
            .field("profile", &core.profile)
            .finish()
    }
}

impl Shared {
    fn is_live(&self, generation: u64) -> bool {
        self.live_generation.load(Ordering::Acquire) == generation
    }

    fn is_frame_live(&self, generation: u64, session: u64) -> bool {
        self.is_live(generation) && self.live_frame_session.load(Ordering::Acquire) == session
    }

    fn start_locked(self: &Arc<Self>, core: &mut Core) -> Result<()> {
        if core.state == ControllerState::Running {
            return Ok(());
        }

        core.generation += 1;
        let generation = core.generation;
        let kind = core.kind;
        let params = self.params.read().clone();

        {
            let mut analyzer = self.analyzer.lock();
            analyzer.set_profile(core.profile);
            analyzer.reset();
        }
        self.pending_colors.clear();
        self.pending_intensity.clear();

        if kind.needs_frames() {
            self.open_frames(core, generation, params.sampling())?;
        }
        if kind.needs_audio() {
            if let Err(e) = self.open_audio(core, generation) {
                self.close_sources(core);
                return Err(e);
            }
        }

        core.mode = Some(AnimationMode::new(kind, &params));
        core.state = ControllerState::Running;
        self.live_generation.store(generation, Ordering::Release);

        if kind.tick_interval(core.profile).is_some() {
            let weak = Arc::downgrade(self);
            let spawned = Ticker::spawn(&format!("auralight-{}", kind), move || {
                weak.upgrade()?.tick(generation)
            });
            match spawned {
                Ok(ticker) => core.ticker = Some(ticker),
                Err(e) => {
                    core.state = ControllerState::Stopped;
                    core.mode = None;
                    self.live_generation.store(0, Ordering::Release);
                    self.close_sources(core);
                    return Err(e);
                }
            }
        }

        info!(
            "Animation started: mode={}, profile={}, sampling={:?}",
            kind,
            core.profile,
            params.sampling()
        );
        Ok(())
    }

    /// Returns the ticker so the caller can join it after releasing the lock
    fn stop_locked(&self, core: &mut Core) -> Option<Ticker> {
        if core.state == ControllerState::Stopped {
            return None;
        }
        core.state = ControllerState::Stopped;
        self.live_generation.store(0, Ordering::Release);
        core.mode = None;

        let ticker = core.ticker.take();
        if let Some(ticker) = &ticker {
            ticker.cancel();
        }
        self.close_sources(core);
        self.pending_colors.clear();
        self.pending_intensity.clear();

        self.emit(Emission::blackout(core.kind));
        info!("Animation stopped: mode={}", core.kind);
        ticker
    }

    fn open_frames(
        self: &Arc<Self>,
        core: &mut Core,
        generation: u64,
        sampling: SamplingMode,
    ) -> Result<()> {
        let source = core
            .frame_source
            .as_mut()
            .ok_or_else(|| ControlError::frame_unavailable("no frame source configured"))?;
        let (width, height) = source.display_size();
        let size = CaptureSize::for_display(width, height, sampling);

        core.frame_session += 1;
        let session = core.frame_session;
        self.live_frame_session.store(session, Ordering::Release);

        let weak = Arc::downgrade(self);
        let on_frame = frame_callback(move |frame| {
            if let Some(shared) = weak.upgrade() {
                shared.on_frame(generation, session, frame);
            }
        });
        let weak = Arc::downgrade(self);
        let on_lost = Arc::new(move |reason: &str| {
            if let Some(shared) = weak.upgrade() {
                shared.on_frame_source_lost(generation, session, reason);
            }
        });

        source.open(size, on_frame, on_lost)?;
        core.frame_open = true;
        debug!("Frame capture opened at {}x{}", size.width, size.height);
        Ok(())
    }

    fn open_audio(self: &Arc<Self>, core: &mut Core, generation: u64) -> Result<()> {
        let source = core
            .audio_source
            .as_mut()
            .ok_or_else(|| ControlError::audio_unavailable("no audio source configured"))?;

        let weak = Arc::downgrade(self);
        let on_intensity: IntensityCallback = Arc::new(move |intensity: f32| {
            if let Some(shared) = weak.upgrade() {
                if shared.is_live(generation) {
                    shared.pending_intensity.publish(intensity);
                }
            }
        });
        let weak = Arc::downgrade(self);
        let on_lost = Arc::new(move |reason: &str| {
            if let Some(shared) = weak.upgrade() {
                shared.on_source_lost(generation, None, "audio", reason);
            }
        });

        source.open(on_intensity, on_lost)?;
        core.audio_open = true;
        debug!("Audio capture opened");
        Ok(())
    }

    fn close_sources(&self, core: &mut Core) {
        if core.frame_open {
            if let Some(source) = core.frame_source.as_mut() {
                source.close();
            }
            core.frame_open = false;
        }
        if core.audio_open {
            if let Some(source) = core.audio_source.as_mut() {
                source.close();
            }
            core.audio_open = false;
        }
    }

    fn reopen_frames(self: &Arc<Self>) -> Result<()> {
        let (ticker, result) = {
            let mut core = self.core.lock();
            if core.state != ControllerState::Running || !core.kind.needs_frames() {
                return Ok(());
            }
            if let Some(source) = core.frame_source.as_mut() {
                source.close();
            }
            core.frame_open = false;
            self.analyzer.lock().reset();

            let sampling = self.params.read().sampling();
            let generation = core.generation;
            match self.open_frames(&mut core, generation, sampling) {
                Ok(()) => (None, Ok(())),
                Err(e) => {
                    warn!("Reopening frame capture failed: {}", e);
                    (self.stop_locked(&mut core), Err(e))
                }
            }
        };
        if let Some(ticker) = ticker {
            ticker.join();
        }
        result
    }

    fn on_frame(&self, generation: u64, session: u64, frame: &FrameBuffer<'_>) {
        if !self.is_frame_live(generation, session) {
            return;
        }
        let params = self.params.read().clone();
        let colors = match self.analyzer.lock().analyze(frame, Instant::now(), &params) {
            Some(colors) => colors,
            None => return,
        };

        let mut core = self.core.lock();
        if !core.is_frame_live(generation, session) {
            return;
        }
        let Some(mode) = core.mode.as_mut() else {
            return;
        };
        if mode.kind() == ModeKind::FusedClock {
            self.pending_colors.publish(colors);
        } else if let Some(emission) = mode.on_colors(colors, &params) {
            self.emit(emission);
        }
    }

    fn tick(&self, generation: u64) -> Option<Duration> {
        let params = self.params.read().clone();
        let mut core = self.core.lock();
        if !core.is_live(generation) {
            return None;
        }
        let interval = core.kind.tick_interval(core.profile)?;
        let colors = self.pending_colors.take();
        let intensity = self.pending_intensity.take();
        if let Some(emission) = core.mode.as_mut()?.on_tick(colors, intensity, &params) {
            self.emit(emission);
        }
        Some(interval)
    }

    fn on_frame_source_lost(&self, generation: u64, session: u64, reason: &str) {
        self.on_source_lost(generation, Some(session), "frame", reason);
    }

    fn on_source_lost(
        &self,
        generation: u64,
        frame_session: Option<u64>,
        source_kind: &str,
        reason: &str,
    ) {
        let ticker = {
            let mut core = self.core.lock();
            let live = match frame_session {
                Some(session) => core.is_frame_live(generation, session),
                None => core.is_live(generation),
            };
            if !live {
                debug!("Ignoring {} loss from a closed session: {}", source_kind, reason);
                return;
            }
            warn!("{} source lost: {}", source_kind, reason);
            self.stop_locked(&mut core)
        };
        if let Some(ticker) = ticker {
            ticker.join();
        }
    }

    fn emit(&self, emission: Emission) {
        for (color, zones) in emission.writes() {
            match self.sink.set_color(color, zones) {
                Ok(()) => {
                    self.sink_writes.fetch_add(1, Ordering::Relaxed);
                    trace!("LED {} <- {}", zones, color);
                }
                Err(e) => {
                    self.sink_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("LED write to {} failed: {}", zones, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ZoneMask;

    #[derive(Default)]
    struct Recorder {
        writes: Mutex<Vec<(ZoneColor, ZoneMask)>>,
    }

    impl LedSink for Recorder {
        fn set_color(&self, color: ZoneColor, zones: ZoneMask) -> Result<()> {
            self.writes.lock().push((color, zones));
            Ok(())
        }
    }

    struct FailingSink;

    impl LedSink for FailingSink {
        fn set_color(&self, _color: ZoneColor, _zones: ZoneMask) -> Result<()> {
            Err(ControlError::Sink("disconnected".into()))
        }
    }

    #[test]
    fn test_missing_frame_source_is_unavailable() {
        let sink = Arc::new(Recorder::default());
        let controller = AnimationController::new(sink.clone());
        let err = controller.start().unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(controller.state(), ControllerState::Stopped);
        drop(controller);
        assert!(sink.writes.lock().is_empty());
    }

    #[test]
    fn test_stop_when_stopped_is_silent() {
        let sink = Arc::new(Recorder::default());
        let controller = AnimationController::new(sink.clone());
        controller.stop();
        controller.stop();
        assert!(sink.writes.lock().is_empty());
    }

    #[test]
    fn test_static_mode_runs_without_sources() {
        let sink = Arc::new(Recorder::default());
        let mut params = AnimationParameters::default();
        params.set_static_color(ZoneColor::new(10, 20, 30));
        let controller = AnimationController::new(sink.clone())
            .with_mode(ModeKind::Static)
            .with_parameters(params);

        controller.start().unwrap();
        assert!(controller.is_running());
        std::thread::sleep(Duration::from_millis(100));
        controller.stop();

        let writes = sink.writes.lock();
        assert_eq!(writes.first(), Some(&(ZoneColor::new(10, 20, 30), ZoneMask::ALL)));
        assert_eq!(writes.last(), Some(&(ZoneColor::BLACK, ZoneMask::ALL)));
        // converged output is written once, then black
        assert_eq!(writes.len(), 2);
    }

    #[test]
    fn test_sink_errors_are_counted() {
        let controller = AnimationController::new(FailingSink).with_mode(ModeKind::Static);
        controller.start().unwrap();
        controller.stop();
        let stats = controller.stats();
        assert!(stats.sink_errors >= 1);
        assert_eq!(stats.sink_writes, 0);
    }
}
