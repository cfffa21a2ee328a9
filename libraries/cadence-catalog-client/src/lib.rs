//! Cadence Catalog Client
//!
//! HTTP implementation of [`cadence_core::TrackCatalog`] for the music
//! backend's REST API.
//!
//! # Features
//!
//! - **Lookup**: fetch one track by id (`404` maps to "not found")
//! - **Listing**: fetch the full track list
//! - **Search**: case-insensitive title filter over the list
//! - **Auth**: optional bearer token
//!
//! # Example
//!
//! ```ignore
//! use cadence_catalog_client::{CatalogClient, CatalogConfig};
//! use cadence_core::{TrackCatalog, TrackId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new(CatalogConfig::new("https://music.example.com/api/v1"))?;
//!
//!     let track = client.get_track(&TrackId::new("12")).await?;
//!     println!("{} - {}", track.artist_name, track.title);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;

pub use client::CatalogClient;
pub use config::CatalogConfig;
pub use error::{CatalogClientError, Result};
