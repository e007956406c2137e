//! Spotify Web API playlist search

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::WellnessError;
use crate::music::catalog::{CatalogPlaylist, MusicCatalog};

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    playlists: Option<PlaylistPage>,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<Option<PlaylistItem>>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    id: String,
    name: String,
}

/// Catalog backed by the Spotify search endpoint
pub struct SpotifyCatalog {
    client: Client,
    api_base: String,
}

impl SpotifyCatalog {
    pub fn new(api_base: impl Into<String>) -> Result<Self, WellnessError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| WellnessError::MusicProvider(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }
}

impl MusicCatalog for SpotifyCatalog {
    fn search_playlists(
        &self,
        access_token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogPlaylist>, WellnessError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.api_base))
            .bearer_auth(access_token)
            .query(&[("q", query), ("type", "playlist"), ("limit", limit.as_str())])
            .send()
            .map_err(|e| WellnessError::MusicProvider(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(WellnessError::MusicTokenExpired);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(%status, body = %body, "music provider search failed");
            return Err(WellnessError::MusicProvider(format!("search failed with {status}")));
        }

        let body: SearchResponse = response
            .json()
            .map_err(|e| WellnessError::MusicProvider(e.to_string()))?;
        let items: Vec<CatalogPlaylist> = body
            .playlists
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|item| CatalogPlaylist {
                id: item.id,
                name: item.name,
            })
            .collect();
        tracing::debug!(query, count = items.len(), "music provider search");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one canned HTTP response and hand back the request head
    fn serve_once(status: &str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/v1", listener.local_addr().unwrap());
        let status = status.to_string();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (base, handle)
    }

    fn catalog(base: String) -> SpotifyCatalog {
        SpotifyCatalog {
            client: Client::builder().no_proxy().build().unwrap(),
            api_base: base,
        }
    }

    #[test]
    fn test_search_parses_playlists() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"playlists": {"items": [null, {"id": "p1", "name": "Chill Mix"}]}}"#,
        );
        let found = catalog(base).search_playlists("tok", "category:chill", 5).unwrap();
        assert_eq!(
            found,
            vec![CatalogPlaylist {
                id: "p1".into(),
                name: "Chill Mix".into()
            }]
        );

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /v1/search?"));
        assert!(request.contains("type=playlist"));
        assert!(request.contains("limit=5"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer tok"));
    }

    #[test]
    fn test_search_without_playlists_section() {
        let (base, server) = serve_once("200 OK", r#"{}"#);
        let found = catalog(base).search_playlists("tok", "category:chill", 5).unwrap();
        assert!(found.is_empty());
        server.join().unwrap();
    }

    #[test]
    fn test_search_unauthorized_is_expired_token() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"error": {"status": 401}}"#);
        let err = catalog(base).search_playlists("stale", "category:chill", 5).unwrap_err();
        assert!(matches!(err, WellnessError::MusicTokenExpired));
        server.join().unwrap();
    }

    #[test]
    fn test_search_server_error_is_provider_error() {
        let (base, server) = serve_once("500 Internal Server Error", r#"{"error": "boom"}"#);
        let err = catalog(base).search_playlists("tok", "category:chill", 5).unwrap_err();
        assert!(matches!(err, WellnessError::MusicProvider(_)));
        assert_eq!(err.status_code(), 502);
        server.join().unwrap();
    }

    #[test]
    fn test_search_response_skips_null_items() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"playlists": {"items": [null, {"id": "p1", "name": "Chill Mix", "owner": {}}]}}"#,
        )
        .unwrap();
        let items: Vec<PlaylistItem> = body.playlists.unwrap().items.into_iter().flatten().collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "p1");
    }

    #[test]
    fn test_api_base_trailing_slash() {
        let catalog = SpotifyCatalog::new("https://example.test/v1/").unwrap();
        assert_eq!(catalog.api_base, "https://example.test/v1");
    }
}
