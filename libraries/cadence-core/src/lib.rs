//! Cadence Core
//!
//! Catalog-facing types, traits, and error handling shared by every Cadence crate.
//!
//! The playback queue and transport only ever see track *identifiers*; the
//! metadata behind those identifiers lives in a [`TrackCatalog`], which is an
//! external collaborator (a remote REST API in production, an
//! [`InMemoryCatalog`] in tests and offline runs).
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{InMemoryCatalog, Track, TrackId};
//!
//! let catalog = InMemoryCatalog::from_tracks(vec![
//!     Track::new("1", "Blue in Green").with_artist("Miles Davis"),
//!     Track::new("2", "So What").with_artist("Miles Davis"),
//! ]);
//!
//! assert_eq!(catalog.len(), 2);
//! assert!(catalog.contains(&TrackId::new("2")));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod traits;
pub mod types;

pub use catalog::InMemoryCatalog;
pub use error::{CoreError, Result};
pub use traits::{TrackBatch, TrackCatalog};
pub use types::{Track, TrackId};
