//! HTTP catalog client.

use crate::config::CatalogConfig;
use crate::error::{CatalogClientError, Result};
use async_trait::async_trait;
use cadence_core::{CoreError, Track, TrackCatalog, TrackId};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Client for the catalog REST API.
///
/// Endpoints, relative to the configured base URL:
/// - `GET track` returns every track as a JSON array
/// - `GET track/{id}` returns one track, or 404
///
/// # Example
///
/// ```ignore
/// use cadence_catalog_client::{CatalogClient, CatalogConfig};
/// use cadence_core::TrackCatalog;
///
/// let client = CatalogClient::new(CatalogConfig::new("https://music.example.com/api/v1"))?;
/// let hits = client.search_tracks("lạc trôi").await?;
/// println!("Found {} tracks", hits.len());
/// ```
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl CatalogClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let raw = config.url.trim();
        if raw.is_empty() {
            return Err(CatalogClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url =
            Url::parse(raw).map_err(|e| CatalogClientError::InvalidUrl(format!("{raw}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(CatalogClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        if base_url.cannot_be_a_base() {
            return Err(CatalogClientError::InvalidUrl(format!(
                "{raw} cannot be used as a base URL"
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Cadence/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(url = %base_url, authenticated = config.access_token.is_some(), "Catalog client ready");

        Ok(Self {
            http,
            base_url,
            access_token: config.access_token,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch one track; `None` when the catalog has no such id.
    pub async fn fetch_track(&self, id: &TrackId) -> Result<Option<Track>> {
        let url = self.endpoint(&["track", id.as_str()])?;
        debug!(url = %url, track_id = %id, "Fetching track");

        let response = send(self.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(track_id = %id, "Track not in catalog");
            return Ok(None);
        }

        let track: Track = check(response).await?.json().await.map_err(|e| {
            CatalogClientError::ParseError(format!("Failed to parse track response: {}", e))
        })?;

        Ok(Some(track))
    }

    /// Fetch the whole track list.
    pub async fn fetch_all_tracks(&self) -> Result<Vec<Track>> {
        let url = self.endpoint(&["track"])?;
        debug!(url = %url, "Fetching track list");

        let response = check(send(self.get(url)).await?).await?;
        let tracks: Vec<Track> = response.json().await.map_err(|e| {
            CatalogClientError::ParseError(format!("Failed to parse track list: {}", e))
        })?;

        debug!(tracks = tracks.len(), "Fetched track list");
        Ok(tracks)
    }

    /// Tracks whose title contains `query`, ignoring case.
    ///
    /// The API has no search endpoint; the list is filtered locally. An empty
    /// query returns every track.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        let tracks = self.fetch_all_tracks().await?;
        let hits: Vec<Track> = tracks
            .into_iter()
            .filter(|track| track.matches_title(query))
            .collect();

        debug!(query, hits = hits.len(), "Searched catalog");
        Ok(hits)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let request = self.http.get(url);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    request.send().await.map_err(|e| {
        if e.is_connect() || e.is_timeout() {
            CatalogClientError::Unreachable(e.to_string())
        } else {
            CatalogClientError::Request(e)
        }
    })
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::UNAUTHORIZED {
        Err(CatalogClientError::AuthRequired)
    } else {
        let error_text = response.text().await.unwrap_or_default();
        Err(CatalogClientError::ServerError {
            status: status.as_u16(),
            message: error_text,
        })
    }
}

#[async_trait]
impl TrackCatalog for CatalogClient {
    async fn get_track(&self, id: &TrackId) -> cadence_core::Result<Track> {
        self.fetch_track(id)
            .await?
            .ok_or_else(|| CoreError::TrackNotFound(id.clone()))
    }

    async fn search_tracks(&self, query: &str) -> cadence_core::Result<Vec<Track>> {
        Ok(self.search(query).await?)
    }
}
