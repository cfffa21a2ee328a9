//! Catalog connection settings.

use serde::{Deserialize, Serialize};

/// Where the catalog lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the API (e.g., "https://music.example.com/api/v1")
    pub url: String,
    /// Bearer token sent with every request, if set
    #[serde(default)]
    pub access_token: Option<String>,
}

impl CatalogConfig {
    /// Create a config without a token.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    /// Create a config that authenticates with `access_token`.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: Some(access_token.into()),
        }
    }
}
