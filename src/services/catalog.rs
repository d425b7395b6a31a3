//! Catalog API client
//!
//! HTTP client for the media catalog backend: lookup-by-slug for movies and
//! TV shows, lookup-by-(slug, season, episode) for episodes.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::media::{EpisodeDetails, Movie, TvShow};

/// Catalog backend error types
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network/connection error
    #[error("network error: {0}")]
    Network(String),
    /// HTTP error (non-2xx status)
    #[error("http error: {0}")]
    Http(u16),
    /// JSON decoding error
    #[error("decode error: {0}")]
    Decode(String),
    /// Empty response from the backend
    #[error("empty response")]
    EmptyResponse,
}

/// The lookup surface the session coordinator depends on.
///
/// A trait so the coordinator can be driven by a scripted backend in tests.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn movie(&self, slug: &str) -> Result<Movie, CatalogError>;
    async fn tv_show(&self, slug: &str) -> Result<TvShow, CatalogError>;
    async fn episode(
        &self,
        slug: &str,
        season: u32,
        episode: u32,
    ) -> Result<EpisodeDetails, CatalogError>;
}

/// Catalog API client backed by reqwest
pub struct CatalogClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    user_agent: String,
}

impl CatalogClient {
    /// Create a new catalog client
    ///
    /// # Arguments
    /// * `base_url` - Backend base URL (e.g., "https://api.example.com/api")
    /// * `token` - Optional bearer token; absence means anonymous access
    pub fn new(base_url: &str, token: Option<String>, timeout_ms: u64, user_agent: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            user_agent: user_agent.to_string(),
        }
    }

    /// Make a GET request against a backend path
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);

        debug!("Catalog request: {}", path);

        let mut request = self.http.get(&url).header("User-Agent", &self.user_agent);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Http(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if text.is_empty() || text == "null" {
            return Err(CatalogError::EmptyResponse);
        }

        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to decode catalog response for '{}': {}", path, e);
            debug!("Response text: {}", &text[..text.len().min(500)]);
            CatalogError::Decode(e.to_string())
        })
    }
}

fn movie_path(slug: &str) -> String {
    format!("/movies/{}", urlencoding::encode(slug))
}

fn tv_show_path(slug: &str) -> String {
    format!("/tv-shows/{}", urlencoding::encode(slug))
}

fn episode_path(slug: &str, season: u32, episode: u32) -> String {
    format!(
        "/tv-shows/{}/season/{}/episode/{}",
        urlencoding::encode(slug),
        season,
        episode
    )
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn movie(&self, slug: &str) -> Result<Movie, CatalogError> {
        self.get(&movie_path(slug)).await
    }

    async fn tv_show(&self, slug: &str) -> Result<TvShow, CatalogError> {
        self.get(&tv_show_path(slug)).await
    }

    async fn episode(
        &self,
        slug: &str,
        season: u32,
        episode: u32,
    ) -> Result<EpisodeDetails, CatalogError> {
        self.get(&episode_path(slug, season, episode)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_paths() {
        assert_eq!(movie_path("inception-27205"), "/movies/inception-27205");
        assert_eq!(tv_show_path("the-wire"), "/tv-shows/the-wire");
        assert_eq!(
            episode_path("breaking-bad-1396", 1, 1),
            "/tv-shows/breaking-bad-1396/season/1/episode/1"
        );
    }

    #[test]
    fn test_lookup_paths_encode_unsafe_slugs() {
        assert_eq!(movie_path("the wire"), "/movies/the%20wire");
        assert_eq!(
            episode_path("a/b", 2, 3),
            "/tv-shows/a%2Fb/season/2/episode/3"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = CatalogClient::new("https://api.example.com/api/", None, 5000, "test");
        assert_eq!(client.base_url, "https://api.example.com/api");
    }
}
