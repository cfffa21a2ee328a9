//! Simulated playback engine
//!
//! Stands in for a real audio device: it keeps a virtual playhead, advances
//! it on a timer while playing, and reports progress and completion through
//! the engine event channel exactly as a device backend would.

use async_trait::async_trait;
use cadence_core::TrackId;
use cadence_playback::{EngineError, EngineEvent, EngineResult, PlaybackEngine, Sequence};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Duration used for tracks the catalog reports without one
pub const DEFAULT_TRACK_DURATION_MS: u64 = 30_000;

#[derive(Debug)]
struct Playhead {
    // Sequence of the load; every event for this track carries it
    sequence: Sequence,
    track_id: TrackId,
    position_ms: u64,
    duration_ms: u64,
    playing: bool,
}

type SharedPlayhead = Arc<Mutex<Option<Playhead>>>;

/// Virtual audio output driven by a tokio interval
pub struct SimulatedEngine {
    playhead: SharedPlayhead,
    durations: HashMap<TrackId, u64>,
    events: mpsc::UnboundedSender<EngineEvent>,
    ticker: JoinHandle<()>,
}

impl SimulatedEngine {
    /// Start an engine that advances `tick * speed` of audio per `tick`
    pub fn new(events: mpsc::UnboundedSender<EngineEvent>, tick: Duration, speed: u32) -> Self {
        let playhead: SharedPlayhead = Arc::new(Mutex::new(None));
        let step_ms = (tick.as_millis() as u64).saturating_mul(u64::from(speed.max(1)));

        let ticker = tokio::spawn(run_ticker(
            Arc::clone(&playhead),
            events.clone(),
            tick,
            step_ms,
        ));

        Self {
            playhead,
            durations: HashMap::new(),
            events,
            ticker,
        }
    }

    /// Known track durations, used when a track is loaded
    pub fn with_durations(mut self, durations: HashMap<TrackId, u64>) -> Self {
        self.durations = durations;
        self
    }

    fn with_playhead<T>(&self, f: impl FnOnce(&mut Playhead) -> T) -> Result<T, EngineError> {
        let mut guard = self.playhead.lock().map_err(|_| EngineError::Unavailable)?;
        match guard.as_mut() {
            Some(playhead) => Ok(f(playhead)),
            None => Err(EngineError::Failed("no track loaded".into())),
        }
    }

    fn report_position(&self, playhead: &Playhead) {
        let _ = self.events.send(EngineEvent::progress(
            playhead.sequence,
            playhead.position_ms,
            Some(playhead.duration_ms),
        ));
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

#[async_trait]
impl PlaybackEngine for SimulatedEngine {
    async fn load_and_play(&self, sequence: Sequence, track_id: &TrackId) -> EngineResult {
        let duration_ms = self
            .durations
            .get(track_id)
            .copied()
            .filter(|duration| *duration > 0)
            .unwrap_or(DEFAULT_TRACK_DURATION_MS);

        let playhead = Playhead {
            sequence,
            track_id: track_id.clone(),
            position_ms: 0,
            duration_ms,
            playing: true,
        };
        info!(%sequence, track_id = %track_id, duration_ms, "Engine loaded track");
        self.report_position(&playhead);

        *self.playhead.lock().map_err(|_| EngineError::Unavailable)? = Some(playhead);
        Ok(())
    }

    async fn pause(&self, sequence: Sequence) -> EngineResult {
        debug!(%sequence, "Engine pause");
        self.with_playhead(|playhead| playhead.playing = false)
    }

    async fn resume(&self, sequence: Sequence) -> EngineResult {
        debug!(%sequence, "Engine resume");
        let finished = self.with_playhead(|playhead| {
            playhead.playing = playhead.position_ms < playhead.duration_ms;
            (!playhead.playing).then_some(playhead.sequence)
        })?;

        // Resuming at the end finishes the track right away
        if let Some(load_sequence) = finished {
            let _ = self.events.send(EngineEvent::completed(load_sequence));
        }
        Ok(())
    }

    async fn seek_to(&self, sequence: Sequence, position_ms: u64) -> EngineResult {
        debug!(%sequence, position_ms, "Engine seek");
        let snapshot = self.with_playhead(|playhead| {
            playhead.position_ms = position_ms.min(playhead.duration_ms);
            (playhead.sequence, playhead.position_ms, playhead.duration_ms)
        })?;

        let (load_sequence, position_ms, duration_ms) = snapshot;
        let _ = self.events.send(EngineEvent::progress(
            load_sequence,
            position_ms,
            Some(duration_ms),
        ));
        Ok(())
    }

    async fn stop(&self, sequence: Sequence) -> EngineResult {
        let previous = self
            .playhead
            .lock()
            .map_err(|_| EngineError::Unavailable)?
            .take();
        if let Some(playhead) = previous {
            debug!(%sequence, track_id = %playhead.track_id, "Engine stopped");
        }
        Ok(())
    }
}

async fn run_ticker(
    shared: SharedPlayhead,
    events: mpsc::UnboundedSender<EngineEvent>,
    tick: Duration,
    step_ms: u64,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let event = {
            let Ok(mut guard) = shared.lock() else {
                return;
            };
            let Some(playhead) = guard.as_mut().filter(|playhead| playhead.playing) else {
                continue;
            };

            playhead.position_ms = playhead
                .position_ms
                .saturating_add(step_ms)
                .min(playhead.duration_ms);

            if playhead.position_ms >= playhead.duration_ms {
                playhead.playing = false;
                EngineEvent::completed(playhead.sequence)
            } else {
                EngineEvent::progress(
                    playhead.sequence,
                    playhead.position_ms,
                    Some(playhead.duration_ms),
                )
            }
        };

        if events.send(event).is_err() {
            return;
        }
    }
}
