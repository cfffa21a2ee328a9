//! Core types for queue and transport management

use crate::error::PlaybackError;
use cadence_core::TrackId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,

    /// Loop the current track only (takes precedence over shuffle)
    Track,

    /// Loop the entire queue
    Queue,
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatMode::Off => write!(f, "off"),
            RepeatMode::Track => write!(f, "track"),
            RepeatMode::Queue => write!(f, "queue"),
        }
    }
}

impl FromStr for RepeatMode {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(RepeatMode::Off),
            "track" | "one" => Ok(RepeatMode::Track),
            "queue" | "all" => Ok(RepeatMode::Queue),
            other => Err(PlaybackError::invalid(format!(
                "unknown repeat mode '{other}' (expected off, track or queue)"
            ))),
        }
    }
}

/// One slot in the queue
///
/// `original_position` is the index the entry had when it was loaded (or
/// appended). It never changes, so un-shuffling is a sort on this field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Track to play
    pub track_id: TrackId,

    /// Position before any shuffle
    pub original_position: usize,
}

/// Read-only projection of the queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Entries in play order
    pub entries: Vec<QueueEntry>,

    /// Index of the current entry (`None` iff `entries` is empty)
    pub cursor: Option<usize>,

    /// Active repeat mode
    pub repeat_mode: RepeatMode,

    /// Whether `entries` is currently a shuffled permutation
    pub shuffled: bool,
}

impl QueueSnapshot {
    /// Track under the cursor
    pub fn current_track_id(&self) -> Option<&TrackId> {
        self.cursor
            .and_then(|index| self.entries.get(index))
            .map(|entry| &entry.track_id)
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of moving the cursor
///
/// Reaching either end of an unrepeated queue is a normal signal, not an
/// error; the caller decides how to surface it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// The cursor now points at this track (it may be the same one under
    /// `RepeatMode::Track`)
    Track(TrackId),

    /// `next` was called on the last entry with repeat off
    EndOfQueue,

    /// `previous` was called on the first entry with repeat off
    StartOfQueue,
}

impl Step {
    /// The track moved to, if any
    pub fn track_id(&self) -> Option<&TrackId> {
        match self {
            Step::Track(id) => Some(id),
            Step::EndOfQueue | Step::StartOfQueue => None,
        }
    }

    /// Whether a queue boundary was hit
    pub fn is_boundary(&self) -> bool {
        !matches!(self, Step::Track(_))
    }
}

/// Playback session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing requested from the engine yet (or reset by `load`/`clear`)
    #[default]
    Idle,

    /// A track was requested and the engine has not confirmed it
    Loading,

    /// Engine confirmed playback
    Playing,

    /// Engine confirmed pause
    Paused,

    /// The queue ran out with repeat off
    Ended,

    /// The engine reported a failure; only `load` recovers
    Error,
}

impl SessionState {
    /// States in which the engine holds a track
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::Loading | SessionState::Playing | SessionState::Paused
        )
    }
}

/// Playback session as seen by the UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSession {
    /// Current state
    pub state: SessionState,

    /// Playback position in milliseconds
    pub position_ms: u64,

    /// Duration of the active track, once known
    pub duration_ms: Option<u64>,

    /// Track the engine was last asked to play
    pub active_track_id: Option<TrackId>,

    /// Message of the failure that moved the session to `Error`
    pub last_error: Option<String>,
}

/// Sequence number attached to every engine command
///
/// Strictly increasing per controller, starting at 1. Acks and engine events
/// carry it back so late callbacks can be told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(u64);

impl Sequence {
    /// Create a sequence from a raw value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Configuration for the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Step used by rewind / fast-forward (default: 10 000 ms)
    pub seek_step_ms: u64,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Seed for reproducible shuffles (default: entropy)
    pub shuffle_seed: Option<u64>,

    /// Number of issued commands kept in the intent log (default: 64)
    pub intent_log_size: usize,

    /// Capacity of the UI event broadcast channel (default: 128)
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            seek_step_ms: 10_000,
            repeat: RepeatMode::Off,
            shuffle: false,
            shuffle_seed: None,
            intent_log_size: 64,
            event_capacity: 128,
        }
    }
}
