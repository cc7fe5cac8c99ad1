//! Synthetic screen capture: a rotating hue gradient.
//!
//! The left half of the frame drifts through the hue wheel while the right
//! half runs half a turn ahead, with a dim vignette so dense sampling has
//! something to reject.

use auralight_control::{ControlError, FrameCallback, FrameSource, LossCallback, Result};
use auralight_core::{CaptureSize, FrameBuffer, BYTES_PER_PIXEL};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use palette::{FromColor, Hsv, Srgb};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::DisplaySettings;

/// Extra bytes at the end of every row, like a real capture surface
const ROW_PADDING: usize = 16;

/// Render one test pattern frame of `width`x`height` at `phase` (turns)
pub fn render_pattern(width: u32, height: u32, phase: f32) -> (Vec<u8>, usize) {
    let row_stride = width as usize * BYTES_PER_PIXEL + ROW_PADDING;
    let mut data = vec![0u8; row_stride * height as usize];

    for y in 0..height {
        let dy = if height > 1 {
            (y as f32 / (height - 1) as f32 - 0.5).abs() * 2.0
        } else {
            0.0
        };
        for x in 0..width {
            let u = if width > 1 {
                x as f32 / (width - 1) as f32
            } else {
                0.0
            };
            let half_offset = if u < 0.5 { 0.0 } else { 0.5 };
            let hue = ((phase + half_offset + u * 0.1).fract()) * 360.0;
            let dx = (u - 0.5).abs() * 2.0;
            let value = (1.0 - 0.6 * dx.max(dy)).clamp(0.05, 1.0);

            let rgb: Srgb = Srgb::from_color(Hsv::new(hue, 0.85, value));
            let offset = y as usize * row_stride + x as usize * BYTES_PER_PIXEL;
            data[offset] = (rgb.red * 255.0).round() as u8;
            data[offset + 1] = (rgb.green * 255.0).round() as u8;
            data[offset + 2] = (rgb.blue * 255.0).round() as u8;
            data[offset + 3] = 255;
        }
    }
    (data, row_stride)
}

/// Frame source rendering [`render_pattern`] on its own thread
pub struct TestPatternSource {
    settings: DisplaySettings,
    stop_tx: Option<Sender<()>>,
}

impl TestPatternSource {
    /// Create a stopped source
    pub fn new(settings: DisplaySettings) -> Self {
        Self {
            settings,
            stop_tx: None,
        }
    }
}

impl FrameSource for TestPatternSource {
    fn display_size(&self) -> (u32, u32) {
        (self.settings.width, self.settings.height)
    }

    fn open(
        &mut self,
        size: CaptureSize,
        on_frame: FrameCallback,
        on_lost: LossCallback,
    ) -> Result<()> {
        if self.stop_tx.is_some() {
            return Err(ControlError::frame_unavailable("capture already running"));
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let frame_interval = Duration::from_secs_f32(1.0 / self.settings.fps.max(1) as f32);
        let cycle = self.settings.cycle_seconds.max(0.1);
        let lose_after = self
            .settings
            .lose_after_seconds
            .map(|secs| Duration::from_secs_f32(secs.max(0.0)));

        thread::Builder::new()
            .name("auralight-pattern".to_string())
            .spawn(move || {
                let started = Instant::now();
                let mut frames: u64 = 0;
                loop {
                    match stop_rx.recv_timeout(frame_interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let elapsed = started.elapsed();
                    if lose_after.is_some_and(|limit| elapsed >= limit) {
                        on_lost("test pattern display disconnected");
                        break;
                    }

                    let phase = elapsed.as_secs_f32() / cycle;
                    let (data, row_stride) = render_pattern(size.width, size.height, phase);
                    match FrameBuffer::new(
                        &data,
                        size.width,
                        size.height,
                        row_stride,
                        BYTES_PER_PIXEL,
                    ) {
                        Ok(frame) => on_frame(&frame),
                        Err(e) => warn!("Dropping malformed pattern frame: {}", e),
                    }
                    frames += 1;
                }
                debug!("Pattern thread exited after {} frames", frames);
            })?;

        self.stop_tx = Some(stop_tx);
        info!(
            "Test pattern capture opened: {}x{} of {}x{} at {} fps",
            size.width, size.height, self.settings.width, self.settings.height, self.settings.fps
        );
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
            info!("Test pattern capture closed");
        }
    }
}

impl Drop for TestPatternSource {
    fn drop(&mut self) {
        self.close();
    }
}
