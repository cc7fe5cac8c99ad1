//! Synthetic audio loudness: a decaying kick on every beat.

use auralight_control::{
    AudioIntensitySource, ControlError, IntensityCallback, LossCallback, Result,
};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::AudioSettings;

/// Kick envelope decay rate per second
const KICK_DECAY: f32 = 8.0;

/// Loudness `elapsed` seconds into the track
pub fn loudness_at(elapsed: f32, settings: &AudioSettings) -> f32 {
    let beat = 60.0 / settings.bpm.max(1.0);
    let since_beat = elapsed.rem_euclid(beat);
    let kick = (-since_beat * KICK_DECAY).exp();
    // slow swell across bars
    let swell = 0.85 + 0.15 * (elapsed * 0.7).sin();
    let floor = settings.floor.clamp(0.0, 1.0);
    (floor + (1.0 - floor) * kick * swell).clamp(0.0, 1.0)
}

/// Loudness source sampling [`loudness_at`] on its own thread
pub struct SyntheticLoudness {
    settings: AudioSettings,
    stop_tx: Option<Sender<()>>,
}

impl SyntheticLoudness {
    /// Create a stopped source
    pub fn new(settings: AudioSettings) -> Self {
        Self {
            settings,
            stop_tx: None,
        }
    }
}

impl AudioIntensitySource for SyntheticLoudness {
    fn open(&mut self, on_intensity: IntensityCallback, _on_lost: LossCallback) -> Result<()> {
        if self.stop_tx.is_some() {
            return Err(ControlError::audio_unavailable("loudness capture already running"));
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let interval = Duration::from_secs_f32(1.0 / self.settings.rate_hz.max(1) as f32);
        let settings = self.settings.clone();

        thread::Builder::new()
            .name("auralight-loudness".to_string())
            .spawn(move || {
                let started = Instant::now();
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    on_intensity(loudness_at(started.elapsed().as_secs_f32(), &settings));
                }
                debug!("Loudness thread exited");
            })?;

        self.stop_tx = Some(stop_tx);
        info!(
            "Synthetic loudness opened: {} bpm at {} Hz",
            self.settings.bpm, self.settings.rate_hz
        );
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
            info!("Synthetic loudness closed");
        }
    }
}

impl Drop for SyntheticLoudness {
    fn drop(&mut self) {
        self.close();
    }
}
