//! Error types for queue and transport management

use cadence_core::CoreError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Bad input to the queue (out-of-range index, empty or duplicate load)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Queue is empty
    #[error("Queue is empty")]
    EmptyQueue,

    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Seek requested before the active track's duration is known
    #[error("Duration of the active track is unknown")]
    DurationUnknown,

    /// The session is in `Error` and must be reloaded
    #[error("Playback failed; load the queue again to recover")]
    RecoveryRequired,

    /// Playback engine error
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Track catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CoreError),

    /// The transport service has shut down
    #[error("Transport service is closed")]
    ServiceClosed,
}

impl PlaybackError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Errors reported by a playback engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine rejected or failed the command
    #[error("{0}")]
    Failed(String),

    /// The engine is not available (device gone, service stopped)
    #[error("Engine unavailable")]
    Unavailable,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
