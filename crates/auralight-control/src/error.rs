//! Error types for the control system
use thiserror::Error;

/// Control system errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// A capture or audio session could not be acquired
    #[error("{source_kind} source unavailable: {reason}")]
    SourceUnavailable {
        /// Which source failed ("frame" or "audio")
        source_kind: &'static str,
        /// Human readable cause
        reason: String,
    },

    /// The LED sink rejected a write
    #[error("LED sink error: {0}")]
    Sink(String),

    /// The periodic tick thread could not be spawned
    #[error("Failed to spawn tick thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ControlError {
    /// Shorthand for an unavailable frame source
    pub fn frame_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_kind: "frame",
            reason: reason.into(),
        }
    }

    /// Shorthand for an unavailable audio source
    pub fn audio_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_kind: "audio",
            reason: reason.into(),
        }
    }

    /// True for [`ControlError::SourceUnavailable`]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
