//! Auralight - Screen and audio reactive ambient lighting
//!
//! Runs the lighting engine end to end against a test pattern capture, a
//! synthetic beat and an LED sink that logs through `tracing`.

#![warn(missing_docs)]

mod cli;
mod config;
mod led_sink;
mod logging_setup;
mod loudness;
mod pattern;

use anyhow::{Context, Result};
use auralight_control::AnimationController;
use clap::Parser;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::AppSettings;
use crate::led_sink::TracingLedSink;
use crate::loudness::SyntheticLoudness;
use crate::pattern::TestPatternSource;

fn load_settings(cli: &Cli) -> Result<AppSettings> {
    let mut settings = match &cli.config {
        Some(path) => AppSettings::load(path)?,
        None => AppSettings::default(),
    };
    cli.apply(&mut settings);
    Ok(settings)
}

fn run(settings: &AppSettings) -> Result<()> {
    let sink = Arc::new(TracingLedSink::new());
    let controller = AnimationController::new(sink.clone())
        .with_frame_source(TestPatternSource::new(settings.display.clone()))
        .with_audio_source(SyntheticLoudness::new(settings.audio.clone()))
        .with_profile(settings.profile)
        .with_parameters(settings.animation.clone())
        .with_mode(settings.mode);

    controller
        .start()
        .with_context(|| format!("Failed to start {} mode", settings.mode))?;

    let started = Instant::now();
    let run_for = (settings.run_seconds > 0).then(|| Duration::from_secs(settings.run_seconds));
    let status_every = Duration::from_secs(settings.status_interval_seconds);

    while controller.is_running() {
        if run_for.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }
        thread::sleep(status_every);
        let stats = controller.stats();
        info!(
            "{} | writes={} frames={} skipped={}",
            sink.state(),
            stats.sink_writes,
            stats.processed_frames,
            stats.skipped_frames
        );
    }

    if !controller.is_running() {
        warn!("Controller stopped on its own, a source was lost");
    }
    controller.stop();

    let stats = controller.stats();
    info!(
        "Session finished after {:.1}s: {} LED writes, {} sink errors, strip dark: {}",
        started.elapsed().as_secs_f32(),
        sink.writes(),
        stats.sink_errors,
        sink.state().is_dark()
    );
    Ok(())
}

/// The main entry point for the application.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    if let Some(path) = &cli.write_config {
        settings.save(path)?;
        println!("Settings written to {:?}", path);
        return Ok(());
    }

    let _log_guard = logging_setup::init(&settings.logging)?;

    info!("==========================================");
    info!("===     Auralight Session Started      ===");
    info!("==========================================");
    info!(
        "Mode {} with profile {} ({} ms)",
        settings.mode,
        settings.profile,
        settings.profile.interval_ms()
    );

    run(&settings)
}
