//! Transport Events
//!
//! Event-based communication for UI synchronization.
//! Events are emitted at key points:
//! - Session state changes (loading/playing/paused/ended/error)
//! - Active track changes
//! - Position updates (engine progress, seeks)
//! - Queue and mode changes

use crate::types::{RepeatMode, SessionState};
use cadence_core::TrackId;
use serde::{Deserialize, Serialize};

/// Events emitted by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportEvent {
    /// Session state changed
    StateChanged {
        /// The new state
        state: SessionState,
    },

    /// A different track was requested from the engine
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Position update
    PositionChanged {
        /// Current playback position
        position_ms: u64,
        /// Track duration, if known
        duration_ms: Option<u64>,
    },

    /// Queue contents or cursor changed
    QueueChanged {
        /// New queue length
        length: usize,
        /// New cursor
        cursor: Option<usize>,
    },

    /// Repeat mode changed
    RepeatModeChanged {
        /// New repeat mode
        mode: RepeatMode,
    },

    /// Shuffle toggled
    ShuffleChanged {
        /// Whether shuffle is now on
        enabled: bool,
    },

    /// The queue ran out with repeat off
    EndOfQueue,

    /// Playback failed
    Error {
        /// Error message
        message: String,
    },
}
