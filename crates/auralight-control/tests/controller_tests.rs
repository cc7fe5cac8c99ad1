//! Controller lifecycle and scheduling tests with manually driven sources.

use auralight_control::{
    AnimationController, AudioIntensitySource, ControlError, ControllerState, FrameCallback,
    FrameSource, IntensityCallback, LedSink, LossCallback, ModeKind, Result, ZoneMask,
};
use auralight_core::{
    AnimationParameters, CaptureSize, OwnedFrame, PerformanceProfile, ZoneColor,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// The stop write of a split-zone mode: left pair then right pair
fn split_black() -> Vec<(ZoneColor, ZoneMask)> {
    vec![(ZoneColor::BLACK, ZoneMask::LEFT), (ZoneColor::BLACK, ZoneMask::RIGHT)]
}

#[derive(Default)]
struct RecordingSink {
    writes: Mutex<Vec<(ZoneColor, ZoneMask)>>,
}

impl RecordingSink {
    fn writes(&self) -> Vec<(ZoneColor, ZoneMask)> {
        self.writes.lock().clone()
    }

    fn len(&self) -> usize {
        self.writes.lock().len()
    }
}

impl LedSink for RecordingSink {
    fn set_color(&self, color: ZoneColor, zones: ZoneMask) -> Result<()> {
        self.writes.lock().push((color, zones));
        Ok(())
    }
}

#[derive(Default)]
struct FrameState {
    callbacks: Mutex<Option<(FrameCallback, LossCallback)>>,
    last_size: Mutex<Option<CaptureSize>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
    fail: AtomicBool,
}

#[derive(Clone, Default)]
struct FakeFrames(Arc<FrameState>);

impl FakeFrames {
    fn failing() -> Self {
        let frames = Self::default();
        frames.0.fail.store(true, Ordering::SeqCst);
        frames
    }

    fn callback(&self) -> Option<FrameCallback> {
        self.0.callbacks.lock().as_ref().map(|(on_frame, _)| on_frame.clone())
    }

    fn push(&self, frame: &OwnedFrame) {
        if let Some(on_frame) = self.callback() {
            on_frame(&frame.as_buffer());
        }
    }

    fn loss_callback(&self) -> Option<LossCallback> {
        self.0.callbacks.lock().as_ref().map(|(_, on_lost)| on_lost.clone())
    }

    fn lose(&self, reason: &str) {
        if let Some(on_lost) = self.loss_callback() {
            on_lost(reason);
        }
    }

    fn opens(&self) -> usize {
        self.0.opens.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.0.closes.load(Ordering::SeqCst)
    }
}

impl FrameSource for FakeFrames {
    fn display_size(&self) -> (u32, u32) {
        (1920, 1080)
    }

    fn open(
        &mut self,
        size: CaptureSize,
        on_frame: FrameCallback,
        on_lost: LossCallback,
    ) -> Result<()> {
        if self.0.fail.load(Ordering::SeqCst) {
            return Err(ControlError::frame_unavailable("capture permission denied"));
        }
        self.0.opens.fetch_add(1, Ordering::SeqCst);
        *self.0.last_size.lock() = Some(size);
        *self.0.callbacks.lock() = Some((on_frame, on_lost));
        Ok(())
    }

    fn close(&mut self) {
        if self.0.callbacks.lock().take().is_some() {
            self.0.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Default)]
struct AudioState {
    callbacks: Mutex<Option<(IntensityCallback, LossCallback)>>,
    closes: AtomicUsize,
    fail: AtomicBool,
}

#[derive(Clone, Default)]
struct FakeAudio(Arc<AudioState>);

impl FakeAudio {
    fn push(&self, intensity: f32) {
        let on_intensity = self.0.callbacks.lock().as_ref().map(|(cb, _)| cb.clone());
        if let Some(on_intensity) = on_intensity {
            on_intensity(intensity);
        }
    }

    fn closes(&self) -> usize {
        self.0.closes.load(Ordering::SeqCst)
    }
}

impl AudioIntensitySource for FakeAudio {
    fn open(&mut self, on_intensity: IntensityCallback, on_lost: LossCallback) -> Result<()> {
        if self.0.fail.load(Ordering::SeqCst) {
            return Err(ControlError::audio_unavailable("no loopback device"));
        }
        *self.0.callbacks.lock() = Some((on_intensity, on_lost));
        Ok(())
    }

    fn close(&mut self) {
        if self.0.callbacks.lock().take().is_some() {
            self.0.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn probe(left: [u8; 3], right: [u8; 3]) -> OwnedFrame {
    let mut frame = OwnedFrame::filled(2, 1, left);
    frame.set_pixel(1, 0, right);
    frame
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn frame_driven(sink: &Arc<RecordingSink>, frames: &FakeFrames) -> AnimationController {
    AnimationController::new(sink.clone())
        .with_frame_source(frames.clone())
        .with_profile(PerformanceProfile::Ragnarok)
        .with_mode(ModeKind::FrameDriven)
}

#[test]
fn test_distinct_frames_emit_twice() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();

    frames.push(&probe([255, 0, 0], [0, 0, 255]));
    frames.push(&probe([0, 255, 0], [255, 255, 0]));

    let writes = sink.writes();
    assert_eq!(writes.len(), 4);
    assert_eq!(writes[0].1, ZoneMask::LEFT);
    assert_eq!(writes[1].1, ZoneMask::RIGHT);
    assert_ne!(writes[0].0, writes[2].0);
    assert_ne!(writes[1].0, writes[3].0);
}

#[test]
fn test_identical_frames_emit_once() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();

    let frame = probe([200, 40, 40], [40, 40, 200]);
    frames.push(&frame);
    frames.push(&frame);

    assert_eq!(sink.len(), 2);
    assert_eq!(controller.stats().processed_frames, 2);
}

#[test]
fn test_throttled_profile_drops_bursts() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames).with_profile(PerformanceProfile::Low);
    controller.start().unwrap();

    frames.push(&probe([255, 0, 0], [0, 0, 255]));
    frames.push(&probe([0, 255, 0], [0, 255, 0]));

    assert_eq!(sink.len(), 2);
    assert_eq!(controller.stats().skipped_frames, 1);
}

#[test]
fn test_emissions_are_brightness_scaled() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let mut params = AnimationParameters::default();
    params.set_response(1.0);
    params.set_target_brightness(0);
    let controller = frame_driven(&sink, &frames).with_parameters(params);
    controller.start().unwrap();

    frames.push(&probe([255, 255, 255], [255, 255, 255]));

    // brightness starts at the target, so output is fully dimmed
    for (color, _) in sink.writes() {
        assert!(color.is_black());
    }
    let state = controller.smoothed_state().unwrap();
    assert!(!state.left.is_black());
}

#[test]
fn test_start_is_idempotent() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();
    controller.start().unwrap();
    assert_eq!(frames.opens(), 1);
    assert_eq!(controller.state(), ControllerState::Running);
}

#[test]
fn test_stop_twice_emits_one_black_and_releases_once() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();

    controller.stop();
    controller.stop();

    assert_eq!(sink.writes(), split_black());
    assert_eq!(frames.closes(), 1);
    assert_eq!(controller.state(), ControllerState::Stopped);
}

#[test]
fn test_late_callback_after_stop_is_ignored() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();

    let in_flight = frames.callback().unwrap();
    controller.stop();
    in_flight(&probe([255, 0, 0], [0, 255, 0]).as_buffer());

    assert_eq!(sink.writes(), split_black());
}

#[test]
fn test_stale_callback_ignored_after_restart() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();
    let stale = frames.callback().unwrap();
    controller.stop();
    controller.start().unwrap();

    stale(&probe([255, 0, 0], [0, 255, 0]).as_buffer());
    assert_eq!(sink.len(), 2);

    frames.push(&probe([255, 0, 0], [0, 255, 0]));
    assert_eq!(sink.len(), 4);
}

#[test]
fn test_unavailable_frame_source_leaves_stopped() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::failing();
    let controller = frame_driven(&sink, &frames);

    let err = controller.start().unwrap_err();
    assert!(matches!(
        err,
        ControlError::SourceUnavailable {
            source_kind: "frame",
            ..
        }
    ));
    assert_eq!(controller.state(), ControllerState::Stopped);
    controller.stop();
    assert!(sink.writes().is_empty());
}

#[test]
fn test_unavailable_audio_releases_frames() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let audio = FakeAudio::default();
    audio.0.fail.store(true, Ordering::SeqCst);
    let controller = AnimationController::new(sink.clone())
        .with_frame_source(frames.clone())
        .with_audio_source(audio.clone())
        .with_mode(ModeKind::FusedClock);

    let err = controller.start().unwrap_err();
    assert!(err.is_unavailable());
    assert_eq!(frames.opens(), 1);
    assert_eq!(frames.closes(), 1);
    assert_eq!(controller.state(), ControllerState::Stopped);
    assert!(sink.writes().is_empty());
}

#[test]
fn test_source_loss_stops_with_black() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();
    frames.push(&probe([10, 200, 10], [10, 10, 200]));

    frames.lose("display disconnected");

    assert_eq!(controller.state(), ControllerState::Stopped);
    let writes = sink.writes();
    assert_eq!(writes.len(), 4);
    assert_eq!(writes[2..], split_black()[..]);
    assert_eq!(frames.closes(), 1);

    controller.stop();
    assert_eq!(sink.len(), 4);
}

#[test]
fn test_fused_idle_ticks_do_not_emit() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let audio = FakeAudio::default();
    let controller = AnimationController::new(sink.clone())
        .with_frame_source(frames.clone())
        .with_audio_source(audio.clone())
        .with_profile(PerformanceProfile::Ragnarok)
        .with_mode(ModeKind::FusedClock);
    controller.start().unwrap();

    thread::sleep(Duration::from_millis(80));
    assert!(sink.writes().is_empty());

    audio.push(0.9);
    assert!(wait_until(Duration::from_secs(2), || sink.len() >= 2));
    let after_sample = sink.len();
    assert_eq!(after_sample, 2);

    thread::sleep(Duration::from_millis(80));
    assert_eq!(sink.len(), after_sample);

    controller.stop();
    assert_eq!(sink.writes()[after_sample..], split_black()[..]);
    assert_eq!(frames.closes(), 1);
    assert_eq!(audio.closes(), 1);
}

#[test]
fn test_fused_merges_color_and_loudness() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let audio = FakeAudio::default();
    let mut params = AnimationParameters::default();
    params.set_response(1.0);
    let controller = AnimationController::new(sink.clone())
        .with_frame_source(frames.clone())
        .with_audio_source(audio.clone())
        .with_profile(PerformanceProfile::Ragnarok)
        .with_parameters(params)
        .with_mode(ModeKind::FusedClock);
    controller.start().unwrap();

    frames.push(&probe([255, 0, 0], [0, 0, 255]));
    audio.push(1.0);

    assert!(wait_until(Duration::from_secs(2), || {
        controller
            .smoothed_state()
            .map_or(false, |state| state.brightness > 0 && !state.left.is_black())
    }));
    assert!(wait_until(Duration::from_secs(2), || {
        sink.writes()
            .iter()
            .any(|(color, zones)| *zones == ZoneMask::LEFT && color.r > 0)
    }));
}

#[test]
fn test_switch_mode_restarts_with_black() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();

    controller.switch_mode(ModeKind::Static).unwrap();
    assert_eq!(controller.mode(), ModeKind::Static);
    assert!(controller.is_running());
    assert_eq!(sink.writes()[..2], split_black()[..]);
    assert_eq!(frames.closes(), 1);

    // static mode addresses all zones at once
    assert!(wait_until(Duration::from_secs(2), || sink.len() >= 3));
    assert_eq!(sink.writes()[2].1, ZoneMask::ALL);
}

#[test]
fn test_switch_mode_while_stopped_only_selects() {
    let sink = Arc::new(RecordingSink::default());
    let controller = AnimationController::new(sink.clone());
    controller.switch_mode(ModeKind::Static).unwrap();
    assert_eq!(controller.state(), ControllerState::Stopped);
    assert!(sink.writes().is_empty());
}

#[test]
fn test_dense_toggle_reopens_capture() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();
    assert_eq!(
        *frames.0.last_size.lock(),
        Some(CaptureSize {
            width: 2,
            height: 1
        })
    );

    controller.set_dense_sampling(true).unwrap();
    assert_eq!(frames.opens(), 2);
    assert_eq!(
        *frames.0.last_size.lock(),
        Some(CaptureSize {
            width: 32,
            height: 18
        })
    );
    assert!(controller.is_running());
    assert!(sink.writes().is_empty());
}

#[test]
fn test_reopened_capture_ignores_previous_capture() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();
    let old_frame = frames.callback().unwrap();
    let old_lost = frames.loss_callback().unwrap();

    controller.set_dense_sampling(true).unwrap();
    old_frame(&probe([255, 0, 0], [0, 255, 0]).as_buffer());
    old_lost("old capture torn down");
    assert!(sink.writes().is_empty());
    assert!(controller.is_running());

    let mut grid = OwnedFrame::filled(32, 18, [200, 0, 0]);
    for y in 0..18 {
        for x in 16..32 {
            grid.set_pixel(x, y, [0, 0, 200]);
        }
    }
    frames.push(&grid);
    assert_eq!(sink.len(), 2);
}

#[test]
fn test_set_parameters_resets_dedup_on_single_color_change() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    let controller = frame_driven(&sink, &frames);
    controller.start().unwrap();

    let uniform = probe([90, 30, 160], [90, 30, 160]);
    frames.push(&uniform);
    assert_eq!(sink.len(), 2);

    // both zones already agree, so only the dedup reset lets this through
    let mut params = controller.parameters();
    params.set_single_color(true);
    controller.set_parameters(params).unwrap();
    frames.push(&uniform);
    assert_eq!(sink.len(), 4);
}

#[test]
fn test_parameter_setters_clamp() {
    let sink = Arc::new(RecordingSink::default());
    let controller = AnimationController::new(sink);
    controller.set_response(4.0);
    controller.set_sensitivity(-1.0);
    controller.set_target_brightness(999);
    controller.set_saturation_boost(f32::INFINITY);

    let params = controller.parameters();
    assert_eq!(params.response(), 1.0);
    assert_eq!(params.sensitivity(), 0.0);
    assert_eq!(params.target_brightness(), 255);
    assert_eq!(params.saturation_boost(), 1.0);
}

#[test]
fn test_drop_stops_running_controller() {
    let sink = Arc::new(RecordingSink::default());
    let frames = FakeFrames::default();
    {
        let controller = frame_driven(&sink, &frames);
        controller.start().unwrap();
    }
    assert_eq!(sink.writes(), split_black());
    assert_eq!(frames.closes(), 1);
}
