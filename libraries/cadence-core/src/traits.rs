/// Core traits for Cadence
use crate::error::Result;
use crate::types::{Track, TrackId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of a batch lookup
///
/// Missing ids are reported alongside the tracks that were found; a partial
/// batch is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackBatch {
    /// Tracks that were found, in request order
    pub tracks: Vec<Track>,

    /// Requested ids the catalog does not know about
    pub missing: Vec<TrackId>,
}

impl TrackBatch {
    /// True when every requested id was resolved
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Read-only provider of track metadata
///
/// Implementations must be safe to share between tasks; the transport controller
/// holds one behind an `Arc` and queries it concurrently with engine commands.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Fetch a single track
    ///
    /// # Errors
    /// Returns [`CoreError::TrackNotFound`](crate::CoreError::TrackNotFound)
    /// if the id is unknown, or a transport error if the catalog is unreachable.
    async fn get_track(&self, id: &TrackId) -> Result<Track>;

    /// Fetch several tracks, tolerating unknown ids
    ///
    /// The default implementation issues one `get_track` per id and collects
    /// not-found ids into [`TrackBatch::missing`]. Any other error aborts the
    /// whole batch.
    async fn list_tracks(&self, ids: &[TrackId]) -> Result<TrackBatch> {
        let mut batch = TrackBatch::default();

        for id in ids {
            match self.get_track(id).await {
                Ok(track) => batch.tracks.push(track),
                Err(err) if err.is_not_found() => {
                    tracing::debug!(track_id = %id, "Track missing from catalog");
                    batch.missing.push(id.clone());
                }
                Err(err) => return Err(err),
            }
        }

        Ok(batch)
    }

    /// Search tracks by title (case-insensitive substring)
    ///
    /// An empty query returns the whole catalog.
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>>;
}
