//! Domain types consumed from the track catalog

mod ids;
mod track;

pub use ids::TrackId;
pub use track::Track;
