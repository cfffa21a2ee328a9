//! Tests for the catalog client against a mock server.

use cadence_catalog_client::{CatalogClient, CatalogClientError, CatalogConfig};
use cadence_core::{CoreError, TrackCatalog, TrackId};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn track_list() -> serde_json::Value {
    json!([
        { "id": 1, "title": "Lạc Trôi", "artistName": "Sơn Tùng M-TP", "durationMs": 233000 },
        { "id": 2, "title": "Hãy Trao Cho Anh", "artistName": "Sơn Tùng M-TP", "durationMs": 245000 },
        { "id": 3, "title": "See You Again", "artist": "Wiz Khalifa", "imageUrl": "https://cdn.example.com/3.jpg" }
    ])
}

async fn client_for(server: &MockServer) -> CatalogClient {
    CatalogClient::new(CatalogConfig::new(format!("{}/api/v1", server.uri()))).unwrap()
}

// =============================================================================
// Client Creation Tests
// =============================================================================

mod client_creation {
    use super::*;

    #[test]
    fn test_valid_https_url() {
        let client = CatalogClient::new(CatalogConfig::new("https://example.com/api/v1/"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_empty_url_rejected() {
        match CatalogClient::new(CatalogConfig::new("  ")).unwrap_err() {
            CatalogClientError::InvalidUrl(msg) => assert!(msg.contains("empty")),
            other => panic!("Expected InvalidUrl error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let result = CatalogClient::new(CatalogConfig::new("ftp://example.com"));
        assert!(matches!(result, Err(CatalogClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_garbage_url_rejected() {
        let result = CatalogClient::new(CatalogConfig::new("not a url"));
        assert!(matches!(result, Err(CatalogClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_with_token() {
        let config = CatalogConfig::with_token("https://example.com", "secret");
        assert_eq!(config.access_token.as_deref(), Some("secret"));
    }
}

// =============================================================================
// Track Lookup Tests
// =============================================================================

mod track_lookup {
    use super::*;

    #[tokio::test]
    async fn test_get_track() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/track/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 2,
                "title": "Hãy Trao Cho Anh",
                "artistName": "Sơn Tùng M-TP",
                "durationMs": 245000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let track = client.get_track(&TrackId::new("2")).await.unwrap();

        assert_eq!(track.id, TrackId::new("2"));
        assert_eq!(track.title, "Hãy Trao Cho Anh");
        assert_eq!(track.duration_ms, 245_000);
    }

    #[tokio::test]
    async fn test_missing_track_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/track/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client
            .fetch_track(&TrackId::new("404"))
            .await
            .unwrap()
            .is_none());

        let err = client.get_track(&TrackId::new("404")).await.unwrap_err();
        assert!(matches!(err, CoreError::TrackNotFound(ref id) if id.as_str() == "404"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_tracks_reports_missing_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/track/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "title": "Lạc Trôi"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/track/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let batch = client
            .list_tracks(&[TrackId::new("1"), TrackId::new("9")])
            .await
            .unwrap();

        assert_eq!(batch.tracks.len(), 1);
        assert_eq!(batch.missing, vec![TrackId::new("9")]);
        assert!(!batch.is_complete());
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/track/1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        match client.fetch_track(&TrackId::new("1")).await.unwrap_err() {
            CatalogClientError::ServerError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database down");
            }
            other => panic!("Expected ServerError, got {other:?}"),
        }

        let err = client.get_track(&TrackId::new("1")).await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/track/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_track(&TrackId::new("1")).await.unwrap_err();
        assert!(matches!(err, CatalogClientError::ParseError(_)));
    }
}

// =============================================================================
// Search Tests
// =============================================================================

mod search {
    use super::*;

    async fn server_with_tracks() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/track"))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_list()))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let server = server_with_tracks().await;
        let client = client_for(&server).await;

        let hits = client.search_tracks("SEE YOU").await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].artist_name, "Wiz Khalifa");
        assert!(hits[0].artwork_ref.is_some());
    }

    #[tokio::test]
    async fn test_empty_query_returns_everything() {
        let server = server_with_tracks().await;
        let client = client_for(&server).await;

        assert_eq!(client.search_tracks("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_without_match() {
        let server = server_with_tracks().await;
        let client = client_for(&server).await;

        assert!(client.search_tracks("nothing like this").await.unwrap().is_empty());
    }
}

// =============================================================================
// Authentication Tests
// =============================================================================

mod authentication {
    use super::*;

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/track"))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(CatalogConfig::with_token(
            format!("{}/api/v1", server.uri()),
            "secret-token",
        ))
        .unwrap();

        assert!(client.fetch_all_tracks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_required() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/track"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_all_tracks().await.unwrap_err();
        assert!(matches!(err, CatalogClientError::AuthRequired));
    }
}
