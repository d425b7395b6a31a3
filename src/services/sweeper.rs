//! Expiry sweeper for watch sessions
//!
//! Runs as a background task on startup, then periodically. Abandoned
//! views (closed tabs, dead clients) never tear their session down
//! explicitly, so idle sessions are dropped after a TTL. Any catalog
//! lookup still in flight for a swept session finds no owner on
//! completion and is discarded.

use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::services::session::SessionCoordinator;

/// Configuration for the sweeper task
pub struct SweeperConfig {
    /// How often to sweep (in seconds)
    pub interval_secs: u64,
    /// How long a session may sit idle before removal (in seconds)
    pub session_ttl_seconds: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            session_ttl_seconds: 900, // 15 minutes
        }
    }
}

/// Start the background sweeper task
///
/// This should be spawned as a background task using `tokio::spawn`.
pub async fn start_sweeper_task(sessions: Arc<SessionCoordinator>, config: SweeperConfig) {
    tracing::info!(
        "Starting session sweeper (interval: {}s, ttl: {}s)",
        config.interval_secs,
        config.session_ttl_seconds
    );

    let mut interval = time::interval(Duration::from_secs(config.interval_secs));

    loop {
        interval.tick().await;

        let removed = sessions.sweep_expired(config.session_ttl_seconds).await;
        if removed > 0 {
            tracing::info!("Sweeper: removed {} expired watch sessions", removed);
        }
    }
}
