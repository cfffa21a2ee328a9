//! Cadence - Playback Queue & Transport
//!
//! Platform-agnostic playback control for Cadence.
//!
//! This crate provides:
//! - A queue with a cursor, repeat modes (Off, Track, Queue) and reversible shuffle
//! - A transport state machine (Idle, Loading, Playing, Paused, Ended, Error)
//! - Sequence-numbered engine commands; late acks and events are discarded
//! - Clamped relative and absolute seeking
//! - An async controller task with a cloneable handle for the UI
//!
//! # Architecture
//!
//! `cadence-playback` never touches audio:
//! - The audio output is a [`PlaybackEngine`] supplied by the platform
//! - Track metadata comes from a [`TrackCatalog`](cadence_core::TrackCatalog)
//! - [`Transport`] is synchronous and I/O free; [`TransportController`] runs
//!   it on a tokio task
//!
//! # Example: Queue
//!
//! ```rust
//! use cadence_core::TrackId;
//! use cadence_playback::{QueueStore, RepeatMode, Step};
//!
//! let mut queue = QueueStore::with_seed(7);
//! let ids = ["a", "b"].into_iter().map(TrackId::new).collect();
//! queue.load(ids, 0).unwrap();
//!
//! assert_eq!(queue.next().unwrap(), Step::Track(TrackId::new("b")));
//! assert_eq!(queue.next().unwrap(), Step::EndOfQueue);
//!
//! queue.set_repeat_mode(RepeatMode::Queue);
//! assert_eq!(queue.next().unwrap(), Step::Track(TrackId::new("a")));
//! ```
//!
//! # Example: Transport
//!
//! ```rust
//! use cadence_core::TrackId;
//! use cadence_playback::{EngineCommand, SessionState, Transport};
//!
//! let mut transport = Transport::default();
//! transport.load(vec![TrackId::new("a")], 0).unwrap();
//!
//! let sequence = transport.play().unwrap().sequence().unwrap();
//! let issued = transport.drain_commands();
//! assert!(matches!(issued[0].command, EngineCommand::LoadAndPlay { .. }));
//!
//! // The engine confirms
//! transport.on_ack(sequence, Ok(()));
//! assert_eq!(transport.state(), SessionState::Playing);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod intent_log;
pub mod queue;
pub mod shuffle;
pub mod transport;
pub mod types;

pub use controller::{TransportController, TransportHandle, TransportSnapshot};
pub use engine::{EngineCommand, EngineEvent, EngineEventKind, EngineResult, PlaybackEngine};
pub use error::{EngineError, PlaybackError, Result};
pub use events::TransportEvent;
pub use intent_log::{IntentLog, IssuedCommand};
pub use queue::QueueStore;
pub use transport::{clamp_seek, Outcome, Transport};
pub use types::{
    PlaybackConfig, PlaybackSession, QueueEntry, QueueSnapshot, RepeatMode, Sequence,
    SessionState, Step,
};
