//! Music provider integration
//!
//! Catalog search is behind the [`MusicCatalog`] trait so the playlist logic
//! runs the same against the offline [`StaticCatalog`] and the Spotify API.

pub mod catalog;
pub mod playlist;
#[cfg(feature = "spotify")]
pub mod spotify;

pub use catalog::{CatalogPlaylist, MusicCatalog, StaticCatalog};
pub use playlist::{category_for, PlaylistSuggestion};
#[cfg(feature = "spotify")]
pub use spotify::SpotifyCatalog;
