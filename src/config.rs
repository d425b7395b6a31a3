use std::env;

use crate::services::player::VideoSource;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub node_env: String,

    // Catalog backend
    pub catalog_api_url: String,
    pub catalog_api_token: Option<String>,
    pub fetch_timeout_ms: u64,

    // Sessions
    pub session_ttl_seconds: u64,
    pub sweep_interval_secs: u64,

    // Playback
    pub primary_source: String,

    // Misc
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .unwrap_or(3001),
            node_env: env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),

            // Catalog backend
            catalog_api_url: env::var("CATALOG_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
            catalog_api_token: env::var("CATALOG_API_TOKEN").ok().filter(|t| !t.is_empty()),
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()
                .unwrap_or(15_000), // 15 seconds

            // Sessions
            session_ttl_seconds: env::var("SESSION_TTL_SECONDS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900), // 15 minutes
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),

            // Playback
            primary_source: env::var("PRIMARY_SOURCE").unwrap_or_else(|_| "vidsrc".to_string()),

            // Misc
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| "Reelgate/0.1".to_string()),
        }
    }

    /// Provider order for new sessions: the configured primary first,
    /// the other known provider as fallback.
    pub fn source_order(&self) -> Vec<VideoSource> {
        match self.primary_source.to_lowercase().as_str() {
            "2embed" => vec![VideoSource::TwoEmbed, VideoSource::VidSrc],
            _ => vec![VideoSource::VidSrc, VideoSource::TwoEmbed],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
