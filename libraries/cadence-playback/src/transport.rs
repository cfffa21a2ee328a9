//! Transport state machine
//!
//! Translates user intents into queue mutations plus engine commands, and
//! reconciles engine callbacks back into the [`PlaybackSession`].
//!
//! ```text
//! Idle -> Loading -> Playing <-> Paused -> Ended
//!            \          \          \
//!             +----------+----------+--> Error --(load)--> Idle
//! ```
//!
//! The transport is synchronous and performs no I/O. Issued commands and UI
//! events accumulate in pending buffers that the owner drains
//! ([`drain_commands`](Transport::drain_commands),
//! [`drain_events`](Transport::drain_events)); the async
//! [`TransportController`](crate::TransportController) forwards them to the
//! engine and the UI.
//!
//! State changes caused by the engine are applied only when the matching
//! callback arrives:
//! - an ack is applied only if its sequence is the outstanding one
//! - an engine event is applied only if it is not older than the load that
//!   started the active track
//!
//! Everything else is stale and dropped.

use crate::engine::{EngineCommand, EngineEvent, EngineEventKind, EngineResult};
use crate::error::{PlaybackError, Result};
use crate::events::TransportEvent;
use crate::intent_log::{IntentLog, IssuedCommand};
use crate::queue::QueueStore;
use crate::types::{
    PlaybackConfig, PlaybackSession, QueueSnapshot, RepeatMode, Sequence, SessionState, Step,
};
use cadence_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What an intent did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// A command was issued to the engine
    Issued(Sequence),

    /// Local state changed; the engine was not involved
    Updated,

    /// The intent has no effect in the current state
    Ignored,

    /// The queue ran out; the session is `Ended`
    EndOfQueue,

    /// Already at the first entry; nothing changed
    StartOfQueue,
}

impl Outcome {
    /// Sequence of the issued command, if any
    pub fn sequence(self) -> Option<Sequence> {
        match self {
            Outcome::Issued(sequence) => Some(sequence),
            _ => None,
        }
    }
}

/// Clamp `position + offset` into `[0, duration]`
///
/// Widened arithmetic, so no offset can overflow or wrap.
pub fn clamp_seek(position_ms: u64, offset_ms: i64, duration_ms: u64) -> u64 {
    let target = i128::from(position_ms) + i128::from(offset_ms);
    target.clamp(0, i128::from(duration_ms)) as u64
}

/// Playback transport
pub struct Transport {
    queue: QueueStore,
    session: PlaybackSession,
    log: IntentLog,

    // Only this sequence's ack may change the session
    awaiting_ack: Option<Sequence>,
    // Sequence of the LoadAndPlay that started the active track
    load_sequence: Option<Sequence>,

    seek_step_ms: u64,

    pending_commands: Vec<IssuedCommand>,
    pending_events: Vec<TransportEvent>,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

impl Transport {
    /// Create a transport with an empty queue
    pub fn new(config: &PlaybackConfig) -> Self {
        let mut queue = match config.shuffle_seed {
            Some(seed) => QueueStore::with_seed(seed),
            None => QueueStore::new(),
        };
        queue.set_repeat_mode(config.repeat);
        queue.set_shuffle(config.shuffle);

        Self {
            queue,
            session: PlaybackSession::default(),
            log: IntentLog::new(config.intent_log_size),
            awaiting_ack: None,
            load_sequence: None,
            seek_step_ms: config.seek_step_ms,
            pending_commands: Vec::new(),
            pending_events: Vec::new(),
        }
    }

    // ===== Queue Intents =====

    /// Replace the queue and reset the session to `Idle`
    ///
    /// This is the only way out of `Error`. Any playing track is stopped.
    pub fn load(&mut self, track_ids: Vec<TrackId>, start_index: usize) -> Result<Outcome> {
        let snapshot = self.queue.load(track_ids, start_index)?;
        info!(
            tracks = snapshot.len(),
            start_index, "Loaded queue"
        );
        self.emit_queue_changed();
        Ok(self.reset_session())
    }

    /// Append tracks to the end of the queue (duplicates allowed)
    pub fn append(&mut self, track_ids: Vec<TrackId>) -> Outcome {
        if track_ids.is_empty() {
            return Outcome::Ignored;
        }
        self.queue.append(track_ids);
        self.emit_queue_changed();
        Outcome::Updated
    }

    /// Empty the queue and reset the session to `Idle`
    pub fn clear(&mut self) -> Outcome {
        self.queue.clear();
        self.emit_queue_changed();
        self.reset_session()
    }

    /// Play the entry at `index`
    pub fn jump_to(&mut self, index: usize) -> Result<Outcome> {
        self.ensure_recoverable()?;
        let track_id = self.queue.jump_to(index)?;
        self.emit_queue_changed();
        Ok(self.start_track(track_id))
    }

    // ===== Transport Intents =====

    /// Start or resume playback
    ///
    /// `Idle` loads the track under the cursor; `Paused` (or a load whose
    /// playback was superseded by a pause) resumes. Already playing, or
    /// `Ended`, is a no-op: leaving `Ended` takes an explicit skip or load.
    pub fn play(&mut self) -> Result<Outcome> {
        self.ensure_recoverable()?;

        match self.effective_state() {
            SessionState::Idle => {
                let track_id = self
                    .queue
                    .current_track_id()
                    .cloned()
                    .ok_or(PlaybackError::EmptyQueue)?;
                Ok(self.start_track(track_id))
            }
            SessionState::Paused | SessionState::Loading => {
                if self.session.active_track_id.is_none() {
                    return Ok(Outcome::Ignored);
                }
                Ok(self.issue(EngineCommand::Resume, SessionState::Playing))
            }
            SessionState::Playing | SessionState::Ended | SessionState::Error => {
                Ok(Outcome::Ignored)
            }
        }
    }

    /// Pause playback (also supersedes a pending load)
    pub fn pause(&mut self) -> Outcome {
        if self.session.state == SessionState::Error {
            return Outcome::Ignored;
        }

        match self.effective_state() {
            SessionState::Playing => self.issue(EngineCommand::Pause, SessionState::Paused),
            _ => Outcome::Ignored,
        }
    }

    /// Flip between play and pause
    pub fn toggle_playback(&mut self) -> Result<Outcome> {
        match self.effective_state() {
            SessionState::Playing => Ok(self.pause()),
            _ => self.play(),
        }
    }

    /// Advance to the next track
    ///
    /// At the end of an unrepeated queue the session becomes `Ended` and the
    /// engine is stopped; nothing loops.
    pub fn skip_next(&mut self) -> Result<Outcome> {
        self.ensure_recoverable()?;
        let step = self.queue.next()?;
        Ok(self.apply_step(step))
    }

    /// Go back to the previous track
    ///
    /// At the start of an unrepeated queue this is a no-op that reports
    /// [`Outcome::StartOfQueue`].
    pub fn skip_previous(&mut self) -> Result<Outcome> {
        self.ensure_recoverable()?;
        let step = self.queue.previous()?;
        Ok(self.apply_step(step))
    }

    /// Seek relative to the current position, clamped to `[0, duration]`
    pub fn seek(&mut self, offset_ms: i64) -> Result<Outcome> {
        let duration_ms = self.seekable_duration()?;
        let target = clamp_seek(self.session.position_ms, offset_ms, duration_ms);
        Ok(self.seek_to(target))
    }

    /// Seek to an absolute position, clamped to `[0, duration]`
    pub fn seek_absolute(&mut self, position_ms: u64) -> Result<Outcome> {
        let duration_ms = self.seekable_duration()?;
        Ok(self.seek_to(position_ms.min(duration_ms)))
    }

    /// Seek backward by the configured step
    pub fn rewind(&mut self) -> Result<Outcome> {
        let step = i64::try_from(self.seek_step_ms).unwrap_or(i64::MAX);
        self.seek(-step)
    }

    /// Seek forward by the configured step
    pub fn fast_forward(&mut self) -> Result<Outcome> {
        let step = i64::try_from(self.seek_step_ms).unwrap_or(i64::MAX);
        self.seek(step)
    }

    // ===== Modes =====

    /// Set repeat mode (affects only future traversal)
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) -> Outcome {
        if self.queue.repeat_mode() == mode {
            return Outcome::Ignored;
        }
        self.queue.set_repeat_mode(mode);
        debug!(?mode, "Repeat mode changed");
        self.pending_events
            .push(TransportEvent::RepeatModeChanged { mode });
        Outcome::Updated
    }

    /// Toggle between repeat-one and repeat off
    pub fn toggle_repeat_one(&mut self) -> Outcome {
        let mode = if self.queue.repeat_mode() == RepeatMode::Track {
            RepeatMode::Off
        } else {
            RepeatMode::Track
        };
        self.set_repeat_mode(mode)
    }

    /// Enable or disable shuffle (affects only future traversal)
    pub fn set_shuffle(&mut self, enabled: bool) -> Outcome {
        if self.queue.is_shuffled() == enabled {
            return Outcome::Ignored;
        }
        self.queue.set_shuffle(enabled);
        debug!(enabled, "Shuffle changed");
        self.pending_events
            .push(TransportEvent::ShuffleChanged { enabled });
        self.emit_queue_changed();
        Outcome::Updated
    }

    /// Flip shuffle
    pub fn toggle_shuffle(&mut self) -> Outcome {
        self.set_shuffle(!self.queue.is_shuffled())
    }

    // ===== Engine Callbacks =====

    /// Apply the engine's acknowledgement of a command
    ///
    /// Returns `false` when the ack is stale and was discarded.
    pub fn on_ack(&mut self, sequence: Sequence, result: EngineResult) -> bool {
        if self.awaiting_ack != Some(sequence) {
            debug!(%sequence, "Discarding stale ack");
            return false;
        }
        self.awaiting_ack = None;

        match result {
            Ok(()) => {
                if let Some(target) = self.log.get(sequence).map(|issued| issued.target) {
                    self.set_state(target);
                }
            }
            Err(err) => {
                warn!(%sequence, error = %err, "Engine rejected command");
                self.fail(err.to_string());
            }
        }
        true
    }

    /// Apply an event pushed by the engine
    ///
    /// Returns `false` when the event is stale and was discarded.
    pub fn on_engine_event(&mut self, event: EngineEvent) -> bool {
        let current = self
            .load_sequence
            .is_some_and(|load| event.sequence >= load);
        if !current || !self.session.state.is_active() {
            debug!(sequence = %event.sequence, kind = ?event.kind, "Discarding stale engine event");
            return false;
        }

        match event.kind {
            EngineEventKind::Progress {
                position_ms,
                duration_ms,
            } => {
                if duration_ms.is_some() {
                    self.session.duration_ms = duration_ms;
                }
                self.session.position_ms = match self.session.duration_ms {
                    Some(duration) => position_ms.min(duration),
                    None => position_ms,
                };
                self.emit_position();
            }
            EngineEventKind::Completed => {
                debug!(track_id = ?self.session.active_track_id, "Track completed");
                if let Ok(step) = self.queue.next() {
                    self.apply_step(step);
                }
            }
            EngineEventKind::Failed { message } => {
                warn!(sequence = %event.sequence, %message, "Engine reported failure");
                self.fail(message);
            }
        }
        true
    }

    /// Record catalog metadata for the track started by `sequence`
    ///
    /// Returns `false` when the track is no longer the active one.
    pub fn on_track_metadata(&mut self, sequence: Sequence, track: &Track) -> bool {
        let current = self.load_sequence == Some(sequence)
            && self.session.active_track_id.as_ref() == Some(&track.id);
        if !current {
            debug!(%sequence, track_id = %track.id, "Discarding stale track metadata");
            return false;
        }

        if track.duration_ms > 0 {
            self.session.duration_ms = Some(track.duration_ms);
            self.session.position_ms = self.session.position_ms.min(track.duration_ms);
            self.emit_position();
        }
        true
    }

    // ===== State Queries =====

    /// Current session
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.session.state
    }

    /// The queue
    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    /// Queue projection for the UI
    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot()
    }

    /// Issued-command log
    pub fn intent_log(&self) -> &IntentLog {
        &self.log
    }

    /// Sequence of the load that started the active track
    pub fn load_sequence(&self) -> Option<Sequence> {
        self.load_sequence
    }

    /// Take commands issued since the last drain, in issue order
    pub fn drain_commands(&mut self) -> Vec<IssuedCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    /// Take UI events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== Internal =====

    // State the session is heading to once the outstanding ack arrives
    fn effective_state(&self) -> SessionState {
        if self.session.state == SessionState::Error {
            return SessionState::Error;
        }
        self.awaiting_ack
            .and_then(|sequence| self.log.get(sequence))
            .map_or(self.session.state, |issued| issued.target)
    }

    fn ensure_recoverable(&self) -> Result<()> {
        if self.session.state == SessionState::Error {
            return Err(PlaybackError::RecoveryRequired);
        }
        Ok(())
    }

    fn seekable_duration(&self) -> Result<u64> {
        self.ensure_recoverable()?;
        if !self.session.state.is_active() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.session.duration_ms.ok_or(PlaybackError::DurationUnknown)
    }

    fn seek_to(&mut self, position_ms: u64) -> Outcome {
        let target = self.effective_state();
        self.session.position_ms = position_ms;
        self.emit_position();
        self.issue(EngineCommand::SeekTo { position_ms }, target)
    }

    fn apply_step(&mut self, step: Step) -> Outcome {
        match step {
            Step::Track(track_id) => {
                self.emit_queue_changed();
                self.start_track(track_id)
            }
            Step::EndOfQueue => {
                info!("Reached end of queue");
                self.pending_events.push(TransportEvent::EndOfQueue);
                if self.session.state != SessionState::Ended {
                    self.set_state(SessionState::Ended);
                    self.issue(EngineCommand::Stop, SessionState::Ended);
                }
                Outcome::EndOfQueue
            }
            Step::StartOfQueue => Outcome::StartOfQueue,
        }
    }

    fn start_track(&mut self, track_id: TrackId) -> Outcome {
        let previous_track_id = self.session.active_track_id.replace(track_id.clone());
        self.session.position_ms = 0;
        self.session.duration_ms = None;
        self.session.last_error = None;

        let outcome = self.issue(
            EngineCommand::LoadAndPlay {
                track_id: track_id.clone(),
            },
            SessionState::Playing,
        );
        self.load_sequence = outcome.sequence();
        self.set_state(SessionState::Loading);

        info!(track_id = %track_id, "Loading track");
        self.pending_events.push(TransportEvent::TrackChanged {
            track_id,
            previous_track_id,
        });
        outcome
    }

    fn reset_session(&mut self) -> Outcome {
        let was_active = self.session.state.is_active();

        self.awaiting_ack = None;
        self.load_sequence = None;
        self.session.active_track_id = None;
        self.session.position_ms = 0;
        self.session.duration_ms = None;
        self.session.last_error = None;
        self.set_state(SessionState::Idle);

        if was_active {
            self.issue(EngineCommand::Stop, SessionState::Idle)
        } else {
            Outcome::Updated
        }
    }

    fn fail(&mut self, message: String) {
        if !self.session.state.is_active() {
            debug!(state = ?self.session.state, %message, "Ignoring failure outside active playback");
            return;
        }
        self.awaiting_ack = None;
        self.session.last_error = Some(message.clone());
        self.set_state(SessionState::Error);
        self.pending_events.push(TransportEvent::Error { message });
    }

    fn issue(&mut self, command: EngineCommand, target: SessionState) -> Outcome {
        let issued = self.log.record(command, target);
        debug!(
            sequence = %issued.sequence,
            command = %issued.command,
            target = ?issued.target,
            "Issuing engine command"
        );
        self.awaiting_ack = Some(issued.sequence);
        let sequence = issued.sequence;
        self.pending_commands.push(issued);
        Outcome::Issued(sequence)
    }

    fn set_state(&mut self, state: SessionState) {
        if self.session.state == state {
            return;
        }
        debug!(from = ?self.session.state, to = ?state, "Session state changed");
        self.session.state = state;
        self.pending_events
            .push(TransportEvent::StateChanged { state });
    }

    fn emit_position(&mut self) {
        self.pending_events.push(TransportEvent::PositionChanged {
            position_ms: self.session.position_ms,
            duration_ms: self.session.duration_ms,
        });
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(TransportEvent::QueueChanged {
            length: self.queue.len(),
            cursor: self.queue.cursor(),
        });
    }
}
