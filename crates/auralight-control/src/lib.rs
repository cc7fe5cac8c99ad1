//! Auralight Control - Runtime for the lighting engine
//!
//! This crate schedules the numeric pipeline from `auralight-core` against
//! live inputs and an LED strip:
//! - **Sources**: screen frames and audio loudness, pushed through callbacks
//! - **Sink**: one RGB write per zone group
//! - **Modes**: frame-driven, fused clock (screen + audio) and static
//! - **Controller**: start/stop lifecycle, pending-sample slots, tick thread
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use auralight_control::{AnimationController, LedSink, ModeKind, Result, ZoneMask};
//! use auralight_core::ZoneColor;
//!
//! struct Printer;
//!
//! impl LedSink for Printer {
//!     fn set_color(&self, color: ZoneColor, zones: ZoneMask) -> Result<()> {
//!         println!("{} <- {}", zones, color);
//!         Ok(())
//!     }
//! }
//!
//! let controller = AnimationController::new(Printer).with_mode(ModeKind::Static);
//! controller.start().unwrap();
//! controller.stop();
//! ```

#![warn(missing_docs)]

/// Error types
pub mod error;

pub mod controller;
pub mod mode;
pub mod sink;
pub mod slot;
pub mod source;
pub mod ticker;

// Re-exports
pub use controller::{AnimationController, ControllerState, ControllerStats};
pub use error::{ControlError, Result};
pub use mode::{AnimationMode, Emission, ModeKind, SmoothedState};
pub use sink::{LedSink, ZoneMask};
pub use slot::PendingSlot;
pub use source::{
    frame_callback, AudioIntensitySource, FrameCallback, FrameSource, IntensityCallback,
    LossCallback,
};
pub use ticker::Ticker;
