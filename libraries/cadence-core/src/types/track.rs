/// Track domain type
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Track metadata as served by the catalog
///
/// Read-only from the playback side: the queue stores only [`TrackId`]s and
/// looks tracks up when it needs a title or a duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Display name of the performing artist
    #[serde(default, alias = "artist")]
    pub artist_name: String,

    /// Track duration in milliseconds
    #[serde(default)]
    pub duration_ms: u64,

    /// Artwork reference (URL or storage key)
    #[serde(default, alias = "imageUrl")]
    pub artwork_ref: Option<String>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist_name: String::new(),
            duration_ms: 0,
            artwork_ref: None,
        }
    }

    /// Set the artist name
    pub fn with_artist(mut self, artist_name: impl Into<String>) -> Self {
        self.artist_name = artist_name.into();
        self
    }

    /// Set the duration in milliseconds
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Set the artwork reference
    pub fn with_artwork(mut self, artwork_ref: impl Into<String>) -> Self {
        self.artwork_ref = Some(artwork_ref.into());
        self
    }

    /// Get the track duration as a Duration
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Case-insensitive substring match on the title
    ///
    /// An empty query matches every track.
    pub fn matches_title(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.title.to_lowercase().contains(&query.to_lowercase())
    }
}
