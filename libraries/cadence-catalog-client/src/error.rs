//! Error types for the catalog client.

use cadence_core::CoreError;
use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
#[derive(Error, Debug)]
pub enum CatalogClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The API requires a token and none (or an invalid one) was sent
    #[error("Authentication required")]
    AuthRequired,

    /// Invalid base URL
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Catalog is offline or unreachable
    #[error("Catalog unreachable: {0}")]
    Unreachable(String),
}

impl From<CatalogClientError> for CoreError {
    fn from(err: CatalogClientError) -> Self {
        match err {
            CatalogClientError::ParseError(msg) => CoreError::Other(msg),
            CatalogClientError::InvalidUrl(msg) => CoreError::InvalidInput(msg),
            other => CoreError::Network(other.to_string()),
        }
    }
}

/// Result type for catalog client operations.
pub type Result<T> = std::result::Result<T, CatalogClientError>;
