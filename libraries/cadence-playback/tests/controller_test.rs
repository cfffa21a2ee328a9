//! Integration tests for the async transport controller
//!
//! Uses a scripted engine whose commands can be held back, so acks arrive
//! exactly when a test wants them to.

use async_trait::async_trait;
use cadence_core::{CoreError, Track, TrackBatch, TrackCatalog, TrackId};
use cadence_playback::{
    EngineCommand, EngineError, EngineEvent, EngineResult, Outcome, PlaybackConfig,
    PlaybackEngine, PlaybackError, Sequence, SessionState, TransportController, TransportEvent,
    TransportHandle, TransportSnapshot,
};
use mockall::mock;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::timeout;

// ===== Test Engine =====

#[derive(Default)]
struct ScriptedEngine {
    calls: Mutex<Vec<(Sequence, EngineCommand)>>,
    gate: Option<Arc<Semaphore>>,
    fail_loads: bool,
}

impl ScriptedEngine {
    fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail_loads: true,
            ..Default::default()
        }
    }

    fn commands(&self) -> Vec<EngineCommand> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, command)| command.clone())
            .collect()
    }

    async fn record(&self, sequence: Sequence, command: EngineCommand) -> EngineResult {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let is_load = matches!(command, EngineCommand::LoadAndPlay { .. });
        self.calls.lock().unwrap().push((sequence, command));

        if self.fail_loads && is_load {
            return Err(EngineError::Failed("unsupported format".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlaybackEngine for ScriptedEngine {
    async fn load_and_play(&self, sequence: Sequence, track_id: &TrackId) -> EngineResult {
        self.record(
            sequence,
            EngineCommand::LoadAndPlay {
                track_id: track_id.clone(),
            },
        )
        .await
    }

    async fn pause(&self, sequence: Sequence) -> EngineResult {
        self.record(sequence, EngineCommand::Pause).await
    }

    async fn resume(&self, sequence: Sequence) -> EngineResult {
        self.record(sequence, EngineCommand::Resume).await
    }

    async fn seek_to(&self, sequence: Sequence, position_ms: u64) -> EngineResult {
        self.record(sequence, EngineCommand::SeekTo { position_ms })
            .await
    }

    async fn stop(&self, sequence: Sequence) -> EngineResult {
        self.record(sequence, EngineCommand::Stop).await
    }
}

mock! {
    Catalog {}

    #[async_trait]
    impl TrackCatalog for Catalog {
        async fn get_track(&self, id: &TrackId) -> cadence_core::Result<Track>;
        async fn list_tracks(&self, ids: &[TrackId]) -> cadence_core::Result<TrackBatch>;
        async fn search_tracks(&self, query: &str) -> cadence_core::Result<Vec<Track>>;
    }
}

// ===== Helpers =====

fn ids(names: &[&str]) -> Vec<TrackId> {
    names.iter().map(|name| TrackId::new(*name)).collect()
}

fn config() -> PlaybackConfig {
    PlaybackConfig {
        shuffle_seed: Some(3),
        ..Default::default()
    }
}

async fn wait_until(
    handle: &TransportHandle,
    predicate: impl FnMut(&TransportSnapshot) -> bool,
) -> TransportSnapshot {
    let mut watch = handle.watch();
    let snapshot = timeout(Duration::from_secs(2), watch.wait_for(predicate))
        .await
        .expect("timed out waiting for transport")
        .expect("controller stopped")
        .clone();
    snapshot
}

async fn wait_for_commands(engine: &ScriptedEngine, count: usize) {
    timeout(Duration::from_secs(2), async {
        while engine.commands().len() < count {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("timed out waiting for engine commands");
}

async fn wait_for_state(handle: &TransportHandle, state: SessionState) -> TransportSnapshot {
    wait_until(handle, |snapshot| snapshot.session.state == state).await
}

// ============================================================================
// Intent handling
// ============================================================================

mod intents {
    use super::*;

    #[tokio::test]
    async fn play_returns_before_engine_confirms() {
        let gate = Arc::new(Semaphore::new(0));
        let engine = Arc::new(ScriptedEngine::gated(gate.clone()));
        let handle = TransportController::new(config(), engine.clone()).spawn();

        handle.load(ids(&["a", "b"]), 0).await.unwrap();
        let outcome = handle.play().await.unwrap();

        assert_eq!(outcome, Outcome::Issued(Sequence::new(1)));
        assert_eq!(handle.snapshot().session.state, SessionState::Loading);
        assert!(engine.commands().is_empty());

        gate.add_permits(1);
        let snapshot = wait_for_state(&handle, SessionState::Playing).await;
        assert_eq!(
            snapshot.session.active_track_id,
            Some(TrackId::new("a"))
        );
    }

    #[tokio::test]
    async fn late_ack_for_superseded_load_is_discarded() {
        let gate = Arc::new(Semaphore::new(0));
        let engine = Arc::new(ScriptedEngine::gated(gate.clone()));
        let handle = TransportController::new(config(), engine.clone()).spawn();
        let mut events = handle.subscribe();

        handle.load(ids(&["a"]), 0).await.unwrap();
        handle.play().await.unwrap();
        handle.pause().await.unwrap();

        gate.add_permits(2);
        wait_for_state(&handle, SessionState::Paused).await;

        assert_eq!(
            engine.commands(),
            vec![
                EngineCommand::LoadAndPlay {
                    track_id: TrackId::new("a")
                },
                EngineCommand::Pause,
            ]
        );

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(!seen.contains(&TransportEvent::StateChanged {
            state: SessionState::Playing
        }));
    }

    #[tokio::test]
    async fn invalid_intents_are_rejected_without_side_effects() {
        let engine = Arc::new(ScriptedEngine::default());
        let handle = TransportController::new(config(), engine.clone()).spawn();

        assert!(matches!(
            handle.play().await,
            Err(PlaybackError::EmptyQueue)
        ));
        assert!(matches!(
            handle.load(ids(&["a", "a"]), 0).await,
            Err(PlaybackError::InvalidArgument(_))
        ));
        assert!(matches!(
            handle.load(ids(&["a"]), 4).await,
            Err(PlaybackError::InvalidArgument(_))
        ));

        assert!(handle.snapshot().queue.is_empty());
        assert!(engine.commands().is_empty());
    }

    #[tokio::test]
    async fn modes_are_reflected_in_snapshot() {
        let engine = Arc::new(ScriptedEngine::default());
        let handle = TransportController::new(config(), engine).spawn();

        handle.load(ids(&["a", "b", "c"]), 1).await.unwrap();
        handle.toggle_repeat_one().await.unwrap();
        handle.set_shuffle(true).await.unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.queue.repeat_mode, cadence_playback::RepeatMode::Track);
        assert!(snapshot.queue.shuffled);
        assert_eq!(snapshot.queue.cursor, Some(0));
        assert_eq!(snapshot.queue.current_track_id(), Some(&TrackId::new("b")));
    }
}

// ============================================================================
// Engine callbacks
// ============================================================================

mod callbacks {
    use super::*;

    #[tokio::test]
    async fn completion_event_advances_queue() {
        let engine = Arc::new(ScriptedEngine::default());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = TransportController::new(config(), engine.clone())
            .with_engine_events(event_rx)
            .spawn();

        handle.load(ids(&["a", "b"]), 0).await.unwrap();
        let first = handle.play().await.unwrap().sequence().unwrap();
        wait_for_state(&handle, SessionState::Playing).await;

        event_tx
            .send(EngineEvent::progress(first, 4_000, Some(5_000)))
            .unwrap();
        wait_until(&handle, |snapshot| snapshot.session.position_ms == 4_000).await;

        event_tx.send(EngineEvent::completed(first)).unwrap();
        let snapshot = wait_until(&handle, |snapshot| {
            snapshot.session.active_track_id == Some(TrackId::new("b"))
                && snapshot.session.state == SessionState::Playing
        })
        .await;
        assert_eq!(snapshot.session.position_ms, 0);
        assert_eq!(snapshot.queue.cursor, Some(1));
    }

    #[tokio::test]
    async fn engine_failure_requires_reload() {
        let engine = Arc::new(ScriptedEngine::failing());
        let handle = TransportController::new(config(), engine).spawn();

        handle.load(ids(&["a"]), 0).await.unwrap();
        handle.play().await.unwrap();

        let snapshot = wait_for_state(&handle, SessionState::Error).await;
        assert_eq!(
            snapshot.session.last_error.as_deref(),
            Some("unsupported format")
        );
        assert!(matches!(
            handle.play().await,
            Err(PlaybackError::RecoveryRequired)
        ));

        handle.load(ids(&["a"]), 0).await.unwrap();
        assert_eq!(handle.snapshot().session.state, SessionState::Idle);
    }

    #[tokio::test]
    async fn catalog_duration_enables_seeking() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_track()
            .withf(|id| id.as_str() == "a")
            .times(1)
            .returning(|id| Ok(Track::new(id.clone(), "Intro").with_duration_ms(200_000)));

        let engine = Arc::new(ScriptedEngine::default());
        let handle = TransportController::new(config(), engine.clone())
            .with_catalog(Arc::new(catalog))
            .spawn();

        handle.load(ids(&["a"]), 0).await.unwrap();
        handle.play().await.unwrap();
        wait_until(&handle, |snapshot| {
            snapshot.session.duration_ms == Some(200_000)
                && snapshot.session.state == SessionState::Playing
        })
        .await;

        handle.fast_forward().await.unwrap();
        handle.seek(1_000_000).await.unwrap();
        handle.rewind().await.unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.session.position_ms, 190_000);
        wait_for_commands(&engine, 4).await;
        assert_eq!(
            engine.commands().last(),
            Some(&EngineCommand::SeekTo {
                position_ms: 190_000
            })
        );
    }

    #[tokio::test]
    async fn missing_catalog_entry_keeps_duration_unknown() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_track()
            .returning(|id| Err(CoreError::TrackNotFound(id.clone())));

        let engine = Arc::new(ScriptedEngine::default());
        let handle = TransportController::new(config(), engine)
            .with_catalog(Arc::new(catalog))
            .spawn();

        handle.load(ids(&["ghost"]), 0).await.unwrap();
        handle.play().await.unwrap();
        wait_for_state(&handle, SessionState::Playing).await;

        assert!(matches!(
            handle.seek(5_000).await,
            Err(PlaybackError::DurationUnknown)
        ));
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn shutdown_stops_engine_and_closes_handle() {
        let engine = Arc::new(ScriptedEngine::default());
        let handle = TransportController::new(config(), engine.clone()).spawn();

        handle.load(ids(&["a"]), 0).await.unwrap();
        handle.play().await.unwrap();
        wait_for_state(&handle, SessionState::Playing).await;

        handle.shutdown().await;

        assert_eq!(engine.commands().last(), Some(&EngineCommand::Stop));
        assert!(matches!(
            handle.play().await,
            Err(PlaybackError::ServiceClosed)
        ));

        // Second shutdown is a no-op
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_gives_up_on_hung_engine() {
        // No permits: every engine call blocks forever
        let gate = Arc::new(Semaphore::new(0));
        let engine = Arc::new(ScriptedEngine::gated(gate));
        let handle = TransportController::new(config(), engine.clone()).spawn();

        handle.load(ids(&["a", "b"]), 0).await.unwrap();
        handle.play().await.unwrap();
        assert_eq!(
            handle.skip_next().await.unwrap(),
            Outcome::Issued(Sequence::new(2))
        );
        assert_eq!(handle.snapshot().session.state, SessionState::Loading);

        timeout(Duration::from_secs(30), handle.shutdown())
            .await
            .expect("shutdown hung behind the engine");

        assert!(engine.commands().is_empty());
        assert!(matches!(
            handle.play().await,
            Err(PlaybackError::ServiceClosed)
        ));
    }

    #[tokio::test]
    async fn clones_share_one_transport() {
        let engine = Arc::new(ScriptedEngine::default());
        let handle = TransportController::new(config(), engine).spawn();
        let other = handle.clone();

        handle.load(ids(&["a", "b"]), 0).await.unwrap();
        other.jump_to(1).await.unwrap();

        let snapshot = wait_for_state(&handle, SessionState::Playing).await;
        assert_eq!(snapshot.session.active_track_id, Some(TrackId::new("b")));
    }
}
