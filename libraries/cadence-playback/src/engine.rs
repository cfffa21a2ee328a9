//! Playback engine interface
//!
//! The engine is the platform's audio output (a native player on mobile, a
//! decoder + device on desktop). The transport never decodes audio; it issues
//! commands, each tagged with a [`Sequence`], and reconciles what the engine
//! reports back.
//!
//! Two channels flow back from the engine:
//! - the **ack** of each command (the future returned by the trait methods)
//! - an **event stream** of [`EngineEvent`]s (progress, natural end, failure)

use crate::error::EngineError;
use crate::types::Sequence;
use async_trait::async_trait;
use cadence_core::TrackId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a single engine command
pub type EngineResult = std::result::Result<(), EngineError>;

/// Platform audio output
///
/// Implementations should return once the command has taken effect (or
/// failed). Events produced by a command must carry that command's sequence.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Load a track and start playing it from the beginning
    async fn load_and_play(&self, sequence: Sequence, track_id: &TrackId) -> EngineResult;

    /// Pause output, keeping position
    async fn pause(&self, sequence: Sequence) -> EngineResult;

    /// Resume output after a pause
    async fn resume(&self, sequence: Sequence) -> EngineResult;

    /// Seek to an absolute position
    async fn seek_to(&self, sequence: Sequence, position_ms: u64) -> EngineResult;

    /// Stop output and release the track
    async fn stop(&self, sequence: Sequence) -> EngineResult;
}

/// Command issued to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineCommand {
    /// Load and play a track
    LoadAndPlay {
        /// Track to load
        track_id: TrackId,
    },

    /// Pause
    Pause,

    /// Resume
    Resume,

    /// Seek to an absolute position
    SeekTo {
        /// Target position
        position_ms: u64,
    },

    /// Stop
    Stop,
}

impl EngineCommand {
    /// Forward this command to an engine
    pub async fn execute(&self, engine: &dyn PlaybackEngine, sequence: Sequence) -> EngineResult {
        match self {
            EngineCommand::LoadAndPlay { track_id } => engine.load_and_play(sequence, track_id).await,
            EngineCommand::Pause => engine.pause(sequence).await,
            EngineCommand::Resume => engine.resume(sequence).await,
            EngineCommand::SeekTo { position_ms } => engine.seek_to(sequence, *position_ms).await,
            EngineCommand::Stop => engine.stop(sequence).await,
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::LoadAndPlay { track_id } => write!(f, "load_and_play({})", track_id),
            EngineCommand::Pause => write!(f, "pause"),
            EngineCommand::Resume => write!(f, "resume"),
            EngineCommand::SeekTo { position_ms } => write!(f, "seek_to({}ms)", position_ms),
            EngineCommand::Stop => write!(f, "stop"),
        }
    }
}

/// Notification pushed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Sequence of the command that produced the event
    pub sequence: Sequence,

    /// What happened
    pub kind: EngineEventKind,
}

impl EngineEvent {
    /// Progress report
    pub fn progress(sequence: Sequence, position_ms: u64, duration_ms: Option<u64>) -> Self {
        Self {
            sequence,
            kind: EngineEventKind::Progress {
                position_ms,
                duration_ms,
            },
        }
    }

    /// Track played to its end
    pub fn completed(sequence: Sequence) -> Self {
        Self {
            sequence,
            kind: EngineEventKind::Completed,
        }
    }

    /// Playback failed
    pub fn failed(sequence: Sequence, message: impl Into<String>) -> Self {
        Self {
            sequence,
            kind: EngineEventKind::Failed {
                message: message.into(),
            },
        }
    }
}

/// Engine event payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEventKind {
    /// Periodic position update
    Progress {
        /// Current position
        position_ms: u64,
        /// Track duration, if the engine knows it
        duration_ms: Option<u64>,
    },

    /// The active track reached its natural end
    Completed,

    /// Playback failed
    Failed {
        /// Engine-provided description
        message: String,
    },
}
