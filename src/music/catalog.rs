//! Music catalog abstraction
//!
//! A catalog answers playlist searches of the form `category:<name> [extra terms]`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::WellnessError;

/// Playlist as returned by a catalog search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPlaylist {
    pub id: String,
    pub name: String,
}

/// Search backend for mood-matched playlists
pub trait MusicCatalog {
    fn search_playlists(
        &self,
        access_token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogPlaylist>, WellnessError>;
}

impl<T: MusicCatalog + ?Sized> MusicCatalog for &T {
    fn search_playlists(
        &self,
        access_token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogPlaylist>, WellnessError> {
        (**self).search_playlists(access_token, query, limit)
    }
}

impl<T: MusicCatalog + ?Sized> MusicCatalog for Box<T> {
    fn search_playlists(
        &self,
        access_token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogPlaylist>, WellnessError> {
        (**self).search_playlists(access_token, query, limit)
    }
}

/// Offline catalog keyed by category name
///
/// A query matches every category named in it, so `category:chill calm`
/// returns the `chill` playlists followed by the `calm` ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    categories: HashMap<String, Vec<CatalogPlaylist>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: &str, playlists: Vec<CatalogPlaylist>) -> Self {
        self.categories.insert(category.to_ascii_lowercase(), playlists);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, WellnessError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

impl MusicCatalog for StaticCatalog {
    fn search_playlists(
        &self,
        _access_token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogPlaylist>, WellnessError> {
        let terms = query
            .trim()
            .trim_start_matches("category:")
            .split_whitespace()
            .map(str::to_ascii_lowercase);

        let mut results: Vec<CatalogPlaylist> = Vec::new();
        for term in terms {
            if let Some(playlists) = self.categories.get(&term) {
                for playlist in playlists {
                    if !results.iter().any(|p| p.id == playlist.id) {
                        results.push(playlist.clone());
                    }
                }
            }
        }
        results.truncate(limit);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(id: &str) -> CatalogPlaylist {
        CatalogPlaylist {
            id: id.into(),
            name: format!("Playlist {id}"),
        }
    }

    #[test]
    fn test_static_search_by_category() {
        let catalog = StaticCatalog::new()
            .with_category("chill", vec![playlist("c1"), playlist("c2")])
            .with_category("calm", vec![playlist("k1"), playlist("c2")]);

        let chill = catalog.search_playlists("tok", "category:chill", 10).unwrap();
        assert_eq!(chill.len(), 2);

        let both = catalog.search_playlists("tok", "category:chill calm", 10).unwrap();
        let ids: Vec<&str> = both.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "k1"]);

        let limited = catalog.search_playlists("tok", "category:chill calm", 1).unwrap();
        assert_eq!(limited.len(), 1);

        assert!(catalog.search_playlists("tok", "category:metal", 10).unwrap().is_empty());
    }

    #[test]
    fn test_static_catalog_from_json() {
        let catalog =
            StaticCatalog::from_json(r#"{"upbeat": [{"id": "u1", "name": "Sunny"}]}"#).unwrap();
        assert_eq!(catalog.category_count(), 1);
        let found = catalog.search_playlists("", "category:Upbeat", 10).unwrap();
        assert_eq!(found[0].name, "Sunny");
    }
}
