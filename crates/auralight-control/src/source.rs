//! Capability contracts for the inputs the controller consumes.
//!
//! Sources push data on a context they choose. Callbacks must return
//! promptly; the controller only stores the latest sample and does the
//! heavy lifting on its own terms.

use auralight_core::{CaptureSize, FrameBuffer};
use std::sync::Arc;

use crate::Result;

/// Receives each captured frame; the buffer is only valid during the call
pub type FrameCallback = Arc<dyn for<'a> Fn(&FrameBuffer<'a>) + Send + Sync>;

/// Receives each loudness sample, nominally in `0.0..=1.0`
pub type IntensityCallback = Arc<dyn Fn(f32) + Send + Sync>;

/// Signals that a running session stopped on its own, with a reason
pub type LossCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Box a closure as a [`FrameCallback`], pinning down its higher-ranked
/// signature
pub fn frame_callback<F>(f: F) -> FrameCallback
where
    F: for<'a> Fn(&FrameBuffer<'a>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Screen capture session
pub trait FrameSource: Send {
    /// Size of the captured display, used to derive the capture grid
    fn display_size(&self) -> (u32, u32);

    /// Begin delivering frames of roughly `size` to `on_frame`.
    ///
    /// Returns [`crate::ControlError::SourceUnavailable`] if capture cannot
    /// start. Must not invoke either callback before returning.
    fn open(&mut self, size: CaptureSize, on_frame: FrameCallback, on_lost: LossCallback)
        -> Result<()>;

    /// Stop delivering frames and release the session. Idempotent; may be
    /// called from within one of this source's own callbacks, so it must not
    /// wait for an in-flight callback to return.
    fn close(&mut self);
}

/// Audio loudness session
pub trait AudioIntensitySource: Send {
    /// Begin delivering loudness samples to `on_intensity`.
    ///
    /// Returns [`crate::ControlError::SourceUnavailable`] if capture cannot
    /// start. Must not invoke either callback before returning.
    fn open(&mut self, on_intensity: IntensityCallback, on_lost: LossCallback) -> Result<()>;

    /// Stop delivering samples and release the session. Same rules as
    /// [`FrameSource::close`].
    fn close(&mut self);
}
