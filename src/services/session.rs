//! Watch session coordination
//!
//! Owns the fetch lifecycle for the entity each viewer is currently on.
//! Navigation resolves a canonical identity, issues exactly one catalog
//! lookup, and guards against out-of-order completions: a response is
//! applied only if the session still points at the identity it was fetched
//! for. Torn-down sessions drop in-flight responses the same way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::metrics;
use crate::models::identity::{self, MediaIdentity, RouteParams};
use crate::models::media::{MediaEntity, MediaKind};
use crate::services::catalog::{CatalogApi, CatalogError};
use crate::services::player::{SourceSelection, VideoSource};

/// Session lookup/playback errors surfaced to route handlers
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("watch session not found")]
    NotFound,
    #[error("no video source configured")]
    PlaybackUnavailable,
}

/// Fetch lifecycle for the entity currently being viewed.
/// An entity is present only in `Loaded`; a failed fetch keeps no partial data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FetchState {
    Idle,
    Loading,
    Loaded { entity: MediaEntity },
    Failed { error: String },
}

/// What a session is pointed at: the resolved identity plus what kind of
/// lookup it requires. Stale-response matching compares the whole target.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchTarget {
    pub kind: MediaKind,
    pub identity: MediaIdentity,
}

/// State owned by a single viewer's watch view
pub struct WatchSession {
    target: Option<WatchTarget>,
    fetch: FetchState,
    sources: SourceSelection,
    last_active: DateTime<Utc>,
}

/// Iframe load signal reported by the front-end for the active source
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOutcome {
    Loaded,
    Failed,
    Retry,
}

/// Poll response for a watch session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<MediaIdentity>,
    pub fetch: FetchState,
    pub sources: SourceSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_episode_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_episode_path: Option<String>,
}

/// Registry of live watch sessions plus the catalog they fetch from
pub struct SessionCoordinator {
    catalog: Arc<dyn CatalogApi>,
    sessions: RwLock<HashMap<Uuid, WatchSession>>,
    source_order: Vec<VideoSource>,
}

impl SessionCoordinator {
    pub fn new(catalog: Arc<dyn CatalogApi>, source_order: Vec<VideoSource>) -> Self {
        Self {
            catalog,
            sessions: RwLock::new(HashMap::new()),
            source_order,
        }
    }

    /// Create an empty session; nothing is fetched until the first navigate
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let session = WatchSession {
            target: None,
            fetch: FetchState::Idle,
            sources: SourceSelection::new(self.source_order.clone()),
            last_active: Utc::now(),
        };
        self.sessions.write().await.insert(id, session);
        debug!("Watch session created: {}", id);
        id
    }

    /// Point a session at a new navigation target.
    ///
    /// Resolves the canonical identity, moves the session to `Loading` and
    /// issues one catalog lookup in the background. Navigating again before
    /// the lookup lands supersedes it; the late response is discarded when it
    /// no longer matches the session's current target.
    pub async fn navigate(
        self: &Arc<Self>,
        id: Uuid,
        params: &RouteParams,
    ) -> Result<MediaIdentity, SessionError> {
        let kind = identity::kind_of(params);
        let resolved = identity::resolve(params);
        metrics::IDENTITY_RESOLUTIONS.inc();

        let target = WatchTarget {
            kind,
            identity: resolved.clone(),
        };

        {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(&id).ok_or(SessionError::NotFound)?;
            session.last_active = Utc::now();

            // Same target already loading or loaded: nothing to redo. A
            // previous failure does refetch, navigation is the retry path.
            if session.target.as_ref() == Some(&target)
                && matches!(session.fetch, FetchState::Loading | FetchState::Loaded { .. })
            {
                return Ok(resolved);
            }

            session.target = Some(target.clone());
            session.fetch = FetchState::Loading;
            session.sources.reset_for_navigation();
        }

        let coordinator = self.clone();
        tokio::spawn(async move {
            let result = coordinator.fetch_target(&target).await;
            coordinator.apply_fetch_result(id, target, result).await;
        });

        Ok(resolved)
    }

    async fn fetch_target(&self, target: &WatchTarget) -> Result<MediaEntity, CatalogError> {
        let identity = &target.identity;
        match target.kind {
            MediaKind::Movie => self
                .catalog
                .movie(&identity.slug)
                .await
                .map(MediaEntity::Movie),
            MediaKind::TvShow => self
                .catalog
                .tv_show(&identity.slug)
                .await
                .map(MediaEntity::TvShow),
            MediaKind::Episode => self
                .catalog
                .episode(
                    &identity.slug,
                    identity.season_number,
                    identity.episode_number,
                )
                .await
                .map(MediaEntity::Episode),
        }
    }

    /// Apply a completed lookup, unless the session moved on in the meantime.
    /// Matching is by target equality at completion time, not issue order.
    async fn apply_fetch_result(
        &self,
        id: Uuid,
        fetched: WatchTarget,
        result: Result<MediaEntity, CatalogError>,
    ) {
        let mut sessions = self.sessions.write().await;

        let Some(session) = sessions.get_mut(&id) else {
            // Torn down (or swept) while the lookup was in flight
            metrics::STALE_DISCARDS.inc();
            debug!(
                "Dropping catalog response for removed session {} ({})",
                id, fetched.identity.slug
            );
            return;
        };

        if session.target.as_ref() != Some(&fetched) {
            metrics::STALE_DISCARDS.inc();
            debug!(
                "Discarding stale catalog response for '{}' on session {}",
                fetched.identity.slug, id
            );
            return;
        }

        match result {
            Ok(entity) => {
                metrics::CATALOG_FETCH_OK.inc();
                session.fetch = FetchState::Loaded { entity };
            }
            Err(e) => {
                metrics::CATALOG_FETCH_FAILED.inc();
                warn!(
                    "Catalog lookup failed for '{}': {}",
                    fetched.identity.slug, e
                );
                session.fetch = FetchState::Failed {
                    error: e.to_string(),
                };
            }
        }
    }

    /// Current state of a session, including the embed URL for the active
    /// provider when an id is known.
    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound)?;
        session.last_active = Utc::now();

        let title = match &session.fetch {
            FetchState::Loaded { entity } => entity.title().map(str::to_string),
            _ => None,
        };

        let player_url = session.target.as_ref().and_then(|target| {
            // Backend id is canonical; the slug-derived id is only the
            // pre-fetch placeholder.
            let playback_id = match &session.fetch {
                FetchState::Loaded { entity } => entity
                    .authoritative_id()
                    .map(|n| n.to_string())
                    .or_else(|| target.identity.derived_id.clone()),
                _ => target.identity.derived_id.clone(),
            }?;
            let source = session.sources.active()?;
            Some(source.embed_url(
                target.kind,
                &playback_id,
                target.identity.season_number,
                target.identity.episode_number,
            ))
        });

        let (prev_episode_path, next_episode_path) = match &session.target {
            Some(target) if target.kind == MediaKind::Episode => (
                target
                    .identity
                    .prev_episode()
                    .map(|identity| identity.episode_path()),
                Some(target.identity.next_episode().episode_path()),
            ),
            _ => (None, None),
        };

        Ok(SessionSnapshot {
            session_id: id,
            kind: session.target.as_ref().map(|target| target.kind),
            identity: session.target.as_ref().map(|target| target.identity.clone()),
            fetch: session.fetch.clone(),
            sources: session.sources.clone(),
            title,
            player_url,
            prev_episode_path,
            next_episode_path,
        })
    }

    /// Record an iframe load signal for the active source
    pub async fn report_source(&self, id: Uuid, outcome: SourceOutcome) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound)?;
        session.last_active = Utc::now();
        match outcome {
            SourceOutcome::Loaded => session.sources.report_ready(),
            SourceOutcome::Failed => session.sources.report_failed(),
            SourceOutcome::Retry => session.sources.retry_active(),
        }
        Ok(())
    }

    /// Explicit, user-triggered switch to the next configured provider.
    /// The identity and fetch state are untouched.
    pub async fn switch_source(&self, id: Uuid) -> Result<VideoSource, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound)?;
        session.last_active = Utc::now();
        let next = session
            .sources
            .switch_next()
            .ok_or(SessionError::PlaybackUnavailable)?;
        metrics::SOURCE_SWITCHES.inc();
        debug!("Session {} switched source to {}", id, next.label());
        Ok(next)
    }

    /// Remove a session entirely; re-entry refetches rather than showing
    /// stale data.
    pub async fn teardown(&self, id: Uuid) -> Result<(), SessionError> {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(_) => {
                debug!("Watch session removed: {}", id);
                Ok(())
            }
            None => Err(SessionError::NotFound),
        }
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    pub async fn sweep_expired(&self, ttl_seconds: u64) -> usize {
        let cutoff = Utc::now() - chrono::Duration::seconds(ttl_seconds as i64);
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_active > cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            metrics::SESSIONS_SWEPT.inc_by(removed as u64);
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::{EpisodeDetails, EpisodeSummary, Movie, TvShow};
    use crate::services::player::SourceStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Catalog stub with per-slug artificial latency and scripted failures
    struct ScriptedCatalog {
        delays_ms: HashMap<String, u64>,
        failing: Vec<String>,
    }

    impl ScriptedCatalog {
        fn new() -> Self {
            Self {
                delays_ms: HashMap::new(),
                failing: Vec::new(),
            }
        }

        fn with_delay(mut self, slug: &str, ms: u64) -> Self {
            self.delays_ms.insert(slug.to_string(), ms);
            self
        }

        fn with_failure(mut self, slug: &str) -> Self {
            self.failing.push(slug.to_string());
            self
        }

        async fn simulate(&self, slug: &str) -> Result<(), CatalogError> {
            if let Some(ms) = self.delays_ms.get(slug) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.failing.iter().any(|s| s == slug) {
                return Err(CatalogError::Http(502));
            }
            Ok(())
        }

        fn show_for(slug: &str) -> TvShow {
            // scripted slugs end in "-<id>" like real ones
            let id = slug
                .rsplit('-')
                .next()
                .and_then(|tail| tail.parse().ok())
                .unwrap_or(0);
            TvShow {
                id,
                name: slug.to_string(),
                slug: Some(slug.to_string()),
                first_air_date: None,
                rating: None,
                overview: None,
                poster_path: None,
                backdrop_path: None,
            }
        }
    }

    #[async_trait]
    impl CatalogApi for ScriptedCatalog {
        async fn movie(&self, slug: &str) -> Result<Movie, CatalogError> {
            self.simulate(slug).await?;
            Ok(Movie {
                id: 27205,
                title: slug.to_string(),
                slug: Some(slug.to_string()),
                release_date: None,
                rating: None,
                overview: None,
                poster_path: None,
                backdrop_path: None,
            })
        }

        async fn tv_show(&self, slug: &str) -> Result<TvShow, CatalogError> {
            self.simulate(slug).await?;
            Ok(Self::show_for(slug))
        }

        async fn episode(
            &self,
            slug: &str,
            season: u32,
            episode: u32,
        ) -> Result<EpisodeDetails, CatalogError> {
            self.simulate(slug).await?;
            Ok(EpisodeDetails {
                tv_show: Some(Self::show_for(slug)),
                episode: Some(EpisodeSummary {
                    id: Some(1),
                    name: Some(format!("{} S{}E{}", slug, season, episode)),
                    season_number: Some(season),
                    episode_number: Some(episode),
                    air_date: None,
                    overview: None,
                    still_path: None,
                }),
            })
        }
    }

    fn coordinator(catalog: ScriptedCatalog) -> Arc<SessionCoordinator> {
        Arc::new(SessionCoordinator::new(
            Arc::new(catalog),
            vec![VideoSource::VidSrc, VideoSource::TwoEmbed],
        ))
    }

    fn episode_route(path: &str) -> RouteParams {
        RouteParams::RawPathOnly {
            path: path.to_string(),
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    #[tokio::test]
    async fn test_navigate_loads_entity() {
        let coordinator = coordinator(ScriptedCatalog::new());
        let id = coordinator.create().await;

        coordinator
            .navigate(id, &episode_route("/tv-shows/breaking-bad-1396/s1/e1"))
            .await
            .unwrap();
        settle().await;

        let snapshot = coordinator.snapshot(id).await.unwrap();
        assert!(matches!(snapshot.fetch, FetchState::Loaded { .. }));
        assert_eq!(snapshot.kind, Some(MediaKind::Episode));
        assert_eq!(
            snapshot.title.as_deref(),
            Some("breaking-bad-1396 S1E1")
        );
        // authoritative show id drives the player URL
        assert_eq!(
            snapshot.player_url.as_deref(),
            Some("https://vidsrc.xyz/embed/tv/1396/1-1")
        );
        assert_eq!(
            snapshot.next_episode_path.as_deref(),
            Some("/tv-shows/breaking-bad-1396/s1/e2")
        );
        assert_eq!(snapshot.prev_episode_path, None);
    }

    #[tokio::test]
    async fn test_stale_response_discarded() {
        // A resolves slowly; B is issued afterwards and resolves first.
        let coordinator = coordinator(
            ScriptedCatalog::new()
                .with_delay("slow-show-111", 80)
                .with_delay("fast-show-222", 5),
        );
        let id = coordinator.create().await;

        coordinator
            .navigate(id, &episode_route("/tv-shows/slow-show-111/s1/e1"))
            .await
            .unwrap();
        coordinator
            .navigate(id, &episode_route("/tv-shows/fast-show-222/s1/e1"))
            .await
            .unwrap();
        settle().await;

        // A's late completion must not overwrite B's state
        let snapshot = coordinator.snapshot(id).await.unwrap();
        assert_eq!(snapshot.identity.unwrap().slug, "fast-show-222");
        match snapshot.fetch {
            FetchState::Loaded { entity } => {
                assert_eq!(entity.authoritative_id(), Some(222));
            }
            other => panic!("expected loaded state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_no_entity() {
        let coordinator =
            coordinator(ScriptedCatalog::new().with_failure("gone-show-404"));
        let id = coordinator.create().await;

        coordinator
            .navigate(id, &episode_route("/tv-shows/gone-show-404/s1/e1"))
            .await
            .unwrap();
        settle().await;

        let snapshot = coordinator.snapshot(id).await.unwrap();
        match snapshot.fetch {
            FetchState::Failed { error } => assert!(error.contains("502")),
            other => panic!("expected failed state, got {:?}", other),
        }
        // slug-derived id still yields a best-effort player URL
        assert_eq!(
            snapshot.player_url.as_deref(),
            Some("https://vidsrc.xyz/embed/tv/404/1-1")
        );
        assert_eq!(snapshot.title, None);
    }

    #[tokio::test]
    async fn test_failed_navigation_refetches_on_retry() {
        let coordinator =
            coordinator(ScriptedCatalog::new().with_failure("flaky-show-7"));
        let id = coordinator.create().await;
        let route = episode_route("/tv-shows/flaky-show-7/s1/e1");

        coordinator.navigate(id, &route).await.unwrap();
        settle().await;
        let snapshot = coordinator.snapshot(id).await.unwrap();
        assert!(matches!(snapshot.fetch, FetchState::Failed { .. }));

        // same identity again: failure state must not swallow the retry
        coordinator.navigate(id, &route).await.unwrap();
        let snapshot = coordinator.snapshot(id).await.unwrap();
        assert!(matches!(
            snapshot.fetch,
            FetchState::Loading | FetchState::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_switch_source_does_not_touch_identity() {
        let coordinator = coordinator(ScriptedCatalog::new());
        let id = coordinator.create().await;

        coordinator
            .navigate(id, &episode_route("/tv-shows/breaking-bad-1396/s1/e1"))
            .await
            .unwrap();
        settle().await;

        coordinator
            .report_source(id, SourceOutcome::Failed)
            .await
            .unwrap();
        let next = coordinator.switch_source(id).await.unwrap();
        assert_eq!(next, VideoSource::TwoEmbed);

        let snapshot = coordinator.snapshot(id).await.unwrap();
        assert_eq!(snapshot.identity.unwrap().slug, "breaking-bad-1396");
        assert_eq!(snapshot.sources.active(), Some(VideoSource::TwoEmbed));
        assert_eq!(
            snapshot.sources.active_status(),
            Some(SourceStatus::Loading)
        );
        assert_eq!(
            snapshot.player_url.as_deref(),
            Some("https://www.2embed.cc/embedtv/1396&s=1&e=1")
        );
    }

    #[tokio::test]
    async fn test_provider_choice_survives_navigation() {
        let coordinator = coordinator(ScriptedCatalog::new());
        let id = coordinator.create().await;

        coordinator
            .navigate(id, &episode_route("/tv-shows/breaking-bad-1396/s1/e1"))
            .await
            .unwrap();
        coordinator.switch_source(id).await.unwrap();

        coordinator
            .navigate(id, &episode_route("/tv-shows/breaking-bad-1396/s1/e2"))
            .await
            .unwrap();
        settle().await;

        let snapshot = coordinator.snapshot(id).await.unwrap();
        assert_eq!(snapshot.sources.active(), Some(VideoSource::TwoEmbed));
    }

    #[tokio::test]
    async fn test_teardown_discards_in_flight_fetch() {
        let coordinator =
            coordinator(ScriptedCatalog::new().with_delay("slow-show-9", 60));
        let id = coordinator.create().await;

        coordinator
            .navigate(id, &episode_route("/tv-shows/slow-show-9/s1/e1"))
            .await
            .unwrap();
        coordinator.teardown(id).await.unwrap();
        settle().await;

        assert!(matches!(
            coordinator.snapshot(id).await,
            Err(SessionError::NotFound)
        ));
        assert_eq!(coordinator.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_movie_route_uses_movie_lookup() {
        let coordinator = coordinator(ScriptedCatalog::new());
        let id = coordinator.create().await;

        coordinator
            .navigate(id, &episode_route("/movies/inception-27205"))
            .await
            .unwrap();
        settle().await;

        let snapshot = coordinator.snapshot(id).await.unwrap();
        assert_eq!(snapshot.kind, Some(MediaKind::Movie));
        assert_eq!(
            snapshot.player_url.as_deref(),
            Some("https://vidsrc.xyz/embed/movie/27205")
        );
        assert_eq!(snapshot.next_episode_path, None);
    }

    #[tokio::test]
    async fn test_sweep_removes_idle_sessions() {
        let coordinator = coordinator(ScriptedCatalog::new());
        coordinator.create().await;
        coordinator.create().await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        let removed = coordinator.sweep_expired(0).await;
        assert_eq!(removed, 2);
        assert_eq!(coordinator.session_count().await, 0);
    }
}
