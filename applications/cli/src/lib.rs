//! Cadence CLI
//!
//! Terminal front end for the Cadence transport: resolves a queue against a
//! catalog, drives a simulated engine, and accepts transport commands line by
//! line.

pub mod commands;
pub mod config;
pub mod engine;

use anyhow::Context;
use cadence_catalog_client::CatalogClient;
use cadence_core::{InMemoryCatalog, Track, TrackCatalog, TrackId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Small offline catalog used when no catalog URL is configured
pub fn demo_catalog() -> InMemoryCatalog {
    InMemoryCatalog::from_tracks(vec![
        Track::new("1", "So What")
            .with_artist("Miles Davis")
            .with_duration_ms(562_000),
        Track::new("2", "Blue in Green")
            .with_artist("Miles Davis")
            .with_duration_ms(337_000),
        Track::new("3", "Take Five")
            .with_artist("The Dave Brubeck Quartet")
            .with_duration_ms(324_000),
        Track::new("4", "Naima")
            .with_artist("John Coltrane")
            .with_duration_ms(261_000),
        Track::new("5", "Peace Piece")
            .with_artist("Bill Evans")
            .with_duration_ms(402_000),
    ])
}

/// Remote catalog if configured, demo catalog otherwise
pub fn build_catalog(config: &AppConfig) -> anyhow::Result<Arc<dyn TrackCatalog>> {
    match config.catalog.client_config() {
        Some(client_config) => {
            let client = CatalogClient::new(client_config).context("Invalid catalog settings")?;
            info!(url = %client.base_url(), "Using remote catalog");
            Ok(Arc::new(client))
        }
        None => {
            info!("No catalog configured, using the demo catalog");
            Ok(Arc::new(demo_catalog()))
        }
    }
}

/// Look up the tracks to queue
///
/// With no ids the whole catalog is queued. Unknown ids are skipped with a
/// warning; an empty result is an error.
pub async fn resolve_queue(
    catalog: &dyn TrackCatalog,
    ids: &[TrackId],
) -> anyhow::Result<Vec<Track>> {
    let tracks = if ids.is_empty() {
        catalog
            .search_tracks("")
            .await
            .context("Failed to list catalog tracks")?
    } else {
        let batch = catalog
            .list_tracks(ids)
            .await
            .context("Failed to look up tracks")?;
        for id in &batch.missing {
            warn!(track_id = %id, "Skipping unknown track");
        }
        batch.tracks
    };

    anyhow::ensure!(!tracks.is_empty(), "Nothing to play");
    Ok(tracks)
}

/// Durations for the simulated engine, keyed by track id
pub fn durations(tracks: &[Track]) -> HashMap<TrackId, u64> {
    tracks
        .iter()
        .filter(|track| track.duration_ms > 0)
        .map(|track| (track.id.clone(), track.duration_ms))
        .collect()
}
