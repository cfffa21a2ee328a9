//! In-memory track catalog
//!
//! Used by tests and by the CLI when no remote catalog is configured.

use crate::error::{CoreError, Result};
use crate::traits::TrackCatalog;
use crate::types::{Track, TrackId};
use async_trait::async_trait;
use std::collections::HashMap;

/// Catalog backed by a map, preserving insertion order for listings
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    tracks: HashMap<TrackId, Track>,
    order: Vec<TrackId>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog from a list of tracks
    ///
    /// Later tracks replace earlier ones with the same id.
    pub fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut catalog = Self::new();
        for track in tracks {
            catalog.insert(track);
        }
        catalog
    }

    /// Insert or replace a track
    pub fn insert(&mut self, track: Track) {
        if !self.tracks.contains_key(&track.id) {
            self.order.push(track.id.clone());
        }
        self.tracks.insert(track.id.clone(), track);
    }

    /// Check whether a track exists
    pub fn contains(&self, id: &TrackId) -> bool {
        self.tracks.contains_key(id)
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All tracks in insertion order
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.order.iter().filter_map(|id| self.tracks.get(id))
    }
}

#[async_trait]
impl TrackCatalog for InMemoryCatalog {
    async fn get_track(&self, id: &TrackId) -> Result<Track> {
        self.tracks
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::TrackNotFound(id.clone()))
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        Ok(self
            .tracks()
            .filter(|track| track.matches_title(query))
            .cloned()
            .collect())
    }
}
