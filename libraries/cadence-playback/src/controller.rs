//! Transport controller
//!
//! Runs a [`Transport`] on its own task and connects it to a
//! [`PlaybackEngine`], an optional [`TrackCatalog`], and the UI.
//!
//! # Concurrency
//!
//! Every input goes through the controller task, one message at a time:
//! - intents from [`TransportHandle`]s
//! - acks of engine commands
//! - engine events
//! - catalog metadata
//!
//! Engine commands are executed by a separate dispatcher task strictly in
//! issue order; each result is fed back as an ack. An intent returns as soon
//! as its command is issued, so a slow engine never blocks the UI.
//!
//! Observers read the latest [`TransportSnapshot`] through a `watch` channel
//! and receive [`TransportEvent`]s through a `broadcast` channel.

use crate::engine::{EngineCommand, EngineEvent, EngineResult, PlaybackEngine};
use crate::error::{PlaybackError, Result};
use crate::events::TransportEvent;
use crate::intent_log::IssuedCommand;
use crate::transport::{Outcome, Transport};
use crate::types::{PlaybackConfig, PlaybackSession, QueueSnapshot, RepeatMode, Sequence};
use cadence_core::{Track, TrackCatalog, TrackId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Capacity of the intent channel
const INTENT_CHANNEL_CAPACITY: usize = 64;

/// How long shutdown waits for the engine to work through queued commands
const DISPATCH_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Queue and session as one consistent view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSnapshot {
    /// Queue projection
    pub queue: QueueSnapshot,

    /// Playback session
    pub session: PlaybackSession,
}

/// User intent forwarded to the controller task
#[derive(Debug, Clone)]
enum Intent {
    Load {
        track_ids: Vec<TrackId>,
        start_index: usize,
    },
    Append(Vec<TrackId>),
    Clear,
    JumpTo(usize),
    Play,
    Pause,
    TogglePlayback,
    SkipNext,
    SkipPrevious,
    Seek(i64),
    SeekAbsolute(u64),
    Rewind,
    FastForward,
    SetRepeatMode(RepeatMode),
    ToggleRepeatOne,
    SetShuffle(bool),
    ToggleShuffle,
}

/// Messages from handles
enum Request {
    Intent {
        intent: Intent,
        reply: oneshot::Sender<Result<Outcome>>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Messages from tasks spawned by the controller
enum Feedback {
    Ack {
        sequence: Sequence,
        result: EngineResult,
    },
    Metadata {
        sequence: Sequence,
        result: cadence_core::Result<Track>,
    },
}

/// Builder for the controller task
pub struct TransportController {
    config: PlaybackConfig,
    engine: Arc<dyn PlaybackEngine>,
    catalog: Option<Arc<dyn TrackCatalog>>,
    engine_events: Option<mpsc::UnboundedReceiver<EngineEvent>>,
}

impl TransportController {
    /// Create a controller driving `engine`
    pub fn new(config: PlaybackConfig, engine: Arc<dyn PlaybackEngine>) -> Self {
        Self {
            config,
            engine,
            catalog: None,
            engine_events: None,
        }
    }

    /// Look up track durations in `catalog` whenever a track is loaded
    pub fn with_catalog(mut self, catalog: Arc<dyn TrackCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Receive engine events (progress, completion, failure) from `events`
    pub fn with_engine_events(mut self, events: mpsc::UnboundedReceiver<EngineEvent>) -> Self {
        self.engine_events = Some(events);
        self
    }

    /// Spawn the controller on the current tokio runtime
    ///
    /// The task runs until [`TransportHandle::shutdown`] is called or every
    /// handle is dropped.
    pub fn spawn(self) -> TransportHandle {
        let transport = Transport::new(&self.config);
        let initial = TransportSnapshot {
            queue: transport.queue_snapshot(),
            session: transport.session().clone(),
        };

        let (request_tx, request_rx) = mpsc::channel(INTENT_CHANNEL_CAPACITY);
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (events_tx, _) = broadcast::channel(self.config.event_capacity.max(1));

        let dispatcher = tokio::spawn(dispatch_commands(
            Arc::clone(&self.engine),
            dispatch_rx,
            feedback_tx.clone(),
        ));

        let worker = Worker {
            transport,
            catalog: self.catalog,
            dispatch_tx,
            feedback_tx,
            snapshot_tx,
            events_tx: events_tx.clone(),
        };
        tokio::spawn(worker.run(request_rx, feedback_rx, self.engine_events, dispatcher));

        info!("Transport controller started");

        TransportHandle {
            requests: request_tx,
            snapshot: snapshot_rx,
            events: events_tx,
        }
    }
}

/// Cloneable handle for issuing intents and observing the transport
#[derive(Clone)]
pub struct TransportHandle {
    requests: mpsc::Sender<Request>,
    snapshot: watch::Receiver<TransportSnapshot>,
    events: broadcast::Sender<TransportEvent>,
}

impl TransportHandle {
    async fn send(&self, intent: Intent) -> Result<Outcome> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request::Intent { intent, reply })
            .await
            .map_err(|_| PlaybackError::ServiceClosed)?;
        response.await.map_err(|_| PlaybackError::ServiceClosed)?
    }

    /// Replace the queue and reset the session
    pub async fn load(&self, track_ids: Vec<TrackId>, start_index: usize) -> Result<Outcome> {
        self.send(Intent::Load {
            track_ids,
            start_index,
        })
        .await
    }

    /// Append tracks to the queue
    pub async fn append(&self, track_ids: Vec<TrackId>) -> Result<Outcome> {
        self.send(Intent::Append(track_ids)).await
    }

    /// Empty the queue and stop playback
    pub async fn clear(&self) -> Result<Outcome> {
        self.send(Intent::Clear).await
    }

    /// Play the queue entry at `index`
    pub async fn jump_to(&self, index: usize) -> Result<Outcome> {
        self.send(Intent::JumpTo(index)).await
    }

    /// Start or resume playback
    pub async fn play(&self) -> Result<Outcome> {
        self.send(Intent::Play).await
    }

    /// Pause playback
    pub async fn pause(&self) -> Result<Outcome> {
        self.send(Intent::Pause).await
    }

    /// Play if paused, pause if playing
    pub async fn toggle_playback(&self) -> Result<Outcome> {
        self.send(Intent::TogglePlayback).await
    }

    /// Skip to the next track
    pub async fn skip_next(&self) -> Result<Outcome> {
        self.send(Intent::SkipNext).await
    }

    /// Skip to the previous track
    pub async fn skip_previous(&self) -> Result<Outcome> {
        self.send(Intent::SkipPrevious).await
    }

    /// Seek relative to the current position
    pub async fn seek(&self, offset_ms: i64) -> Result<Outcome> {
        self.send(Intent::Seek(offset_ms)).await
    }

    /// Seek to an absolute position
    pub async fn seek_absolute(&self, position_ms: u64) -> Result<Outcome> {
        self.send(Intent::SeekAbsolute(position_ms)).await
    }

    /// Seek backward by the configured step
    pub async fn rewind(&self) -> Result<Outcome> {
        self.send(Intent::Rewind).await
    }

    /// Seek forward by the configured step
    pub async fn fast_forward(&self) -> Result<Outcome> {
        self.send(Intent::FastForward).await
    }

    /// Set the repeat mode
    pub async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<Outcome> {
        self.send(Intent::SetRepeatMode(mode)).await
    }

    /// Toggle between repeat-one and repeat off
    pub async fn toggle_repeat_one(&self) -> Result<Outcome> {
        self.send(Intent::ToggleRepeatOne).await
    }

    /// Enable or disable shuffle
    pub async fn set_shuffle(&self, enabled: bool) -> Result<Outcome> {
        self.send(Intent::SetShuffle(enabled)).await
    }

    /// Flip shuffle
    pub async fn toggle_shuffle(&self) -> Result<Outcome> {
        self.send(Intent::ToggleShuffle).await
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> TransportSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch snapshots as they change
    pub fn watch(&self) -> watch::Receiver<TransportSnapshot> {
        self.snapshot.clone()
    }

    /// Subscribe to transport events
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    /// Stop playback and the controller task
    ///
    /// Waits until outstanding engine commands (including the final stop)
    /// have been executed, or gives up on them after a short grace period
    /// if the engine hangs. Calling it on a stopped controller is a no-op.
    pub async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self.requests.send(Request::Shutdown { done }).await.is_ok() {
            let _ = finished.await;
        }
    }
}

/// State owned by the controller task
struct Worker {
    transport: Transport,
    catalog: Option<Arc<dyn TrackCatalog>>,
    dispatch_tx: mpsc::UnboundedSender<IssuedCommand>,
    feedback_tx: mpsc::UnboundedSender<Feedback>,
    snapshot_tx: watch::Sender<TransportSnapshot>,
    events_tx: broadcast::Sender<TransportEvent>,
}

impl Worker {
    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut feedback: mpsc::UnboundedReceiver<Feedback>,
        mut engine_events: Option<mpsc::UnboundedReceiver<EngineEvent>>,
        dispatcher: JoinHandle<()>,
    ) {
        let mut shutdown_done = None;

        loop {
            tokio::select! {
                biased;

                Some(message) = feedback.recv() => self.handle_feedback(message),

                event = next_engine_event(&mut engine_events) => match event {
                    Some(event) => {
                        self.transport.on_engine_event(event);
                    }
                    None => {
                        debug!("Engine event stream closed");
                        engine_events = None;
                    }
                },

                request = requests.recv() => match request {
                    Some(Request::Intent { intent, reply }) => {
                        let outcome = self.handle_intent(intent);
                        self.flush();
                        let _ = reply.send(outcome);
                        continue;
                    }
                    Some(Request::Shutdown { done }) => {
                        shutdown_done = Some(done);
                        break;
                    }
                    None => break,
                },
            }

            self.flush();
        }

        // Stop the engine before the dispatcher drains
        self.transport.clear();
        self.flush();
        drop(self.dispatch_tx);
        let mut dispatcher = dispatcher;
        if timeout(DISPATCH_DRAIN_TIMEOUT, &mut dispatcher).await.is_err() {
            warn!(
                timeout_ms = DISPATCH_DRAIN_TIMEOUT.as_millis() as u64,
                "Engine did not finish outstanding commands; abandoning them"
            );
            dispatcher.abort();
        }

        info!("Transport controller stopped");
        if let Some(done) = shutdown_done {
            let _ = done.send(());
        }
    }

    fn handle_intent(&mut self, intent: Intent) -> Result<Outcome> {
        debug!(?intent, "Handling intent");
        let transport = &mut self.transport;

        match intent {
            Intent::Load {
                track_ids,
                start_index,
            } => transport.load(track_ids, start_index),
            Intent::Append(track_ids) => Ok(transport.append(track_ids)),
            Intent::Clear => Ok(transport.clear()),
            Intent::JumpTo(index) => transport.jump_to(index),
            Intent::Play => transport.play(),
            Intent::Pause => Ok(transport.pause()),
            Intent::TogglePlayback => transport.toggle_playback(),
            Intent::SkipNext => transport.skip_next(),
            Intent::SkipPrevious => transport.skip_previous(),
            Intent::Seek(offset_ms) => transport.seek(offset_ms),
            Intent::SeekAbsolute(position_ms) => transport.seek_absolute(position_ms),
            Intent::Rewind => transport.rewind(),
            Intent::FastForward => transport.fast_forward(),
            Intent::SetRepeatMode(mode) => Ok(transport.set_repeat_mode(mode)),
            Intent::ToggleRepeatOne => Ok(transport.toggle_repeat_one()),
            Intent::SetShuffle(enabled) => Ok(transport.set_shuffle(enabled)),
            Intent::ToggleShuffle => Ok(transport.toggle_shuffle()),
        }
    }

    fn handle_feedback(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::Ack { sequence, result } => {
                self.transport.on_ack(sequence, result);
            }
            Feedback::Metadata {
                sequence,
                result: Ok(track),
            } => {
                self.transport.on_track_metadata(sequence, &track);
            }
            Feedback::Metadata {
                sequence,
                result: Err(e),
            } => {
                warn!(%sequence, error = %e, "Failed to fetch track metadata");
            }
        }
    }

    /// Forward issued commands, publish events and the new snapshot
    fn flush(&mut self) {
        for issued in self.transport.drain_commands() {
            if let EngineCommand::LoadAndPlay { track_id } = &issued.command {
                self.fetch_metadata(issued.sequence, track_id.clone());
            }
            if self.dispatch_tx.send(issued).is_err() {
                warn!("Engine dispatcher is gone; command dropped");
            }
        }

        for event in self.transport.drain_events() {
            // No subscribers is fine
            let _ = self.events_tx.send(event);
        }

        let snapshot = TransportSnapshot {
            queue: self.transport.queue_snapshot(),
            session: self.transport.session().clone(),
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn fetch_metadata(&self, sequence: Sequence, track_id: TrackId) {
        let Some(catalog) = self.catalog.clone() else {
            return;
        };
        let feedback = self.feedback_tx.clone();

        tokio::spawn(async move {
            let result = catalog.get_track(&track_id).await;
            let _ = feedback.send(Feedback::Metadata { sequence, result });
        });
    }
}

/// Execute commands one after another and report each result
async fn dispatch_commands(
    engine: Arc<dyn PlaybackEngine>,
    mut commands: mpsc::UnboundedReceiver<IssuedCommand>,
    feedback: mpsc::UnboundedSender<Feedback>,
) {
    while let Some(issued) = commands.recv().await {
        debug!(sequence = %issued.sequence, command = %issued.command, "Dispatching to engine");
        let result = issued.command.execute(engine.as_ref(), issued.sequence).await;
        if let Err(e) = &result {
            debug!(sequence = %issued.sequence, error = %e, "Engine command failed");
        }

        // During shutdown nobody listens; keep executing so the final stop lands
        let _ = feedback.send(Feedback::Ack {
            sequence: issued.sequence,
            result,
        });
    }
}

async fn next_engine_event(
    events: &mut Option<mpsc::UnboundedReceiver<EngineEvent>>,
) -> Option<EngineEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}
