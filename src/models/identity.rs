use lazy_static::lazy_static;
use lru::LruCache;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use crate::models::media::MediaKind;

// Resolution runs on every navigation event and the same raw inputs repeat
// constantly (back/forward, episode hopping), so results are memoized.
lazy_static! {
    static ref RESOLVE_CACHE: Mutex<LruCache<RouteParams, MediaIdentity>> =
        Mutex::new(LruCache::new(NonZeroUsize::new(4096).unwrap()));

    static ref NON_DIGITS: Regex = Regex::new(r"\D").unwrap();
    static ref ALL_DIGITS: Regex = Regex::new(r"^\d+$").unwrap();
}

// Positional segments of a raw watch path: /tv-shows/:slug/:season/:episode
const SEGMENT_SLUG: usize = 2;
const SEGMENT_SEASON: usize = 3;
const SEGMENT_EPISODE: usize = 4;

/// The historically accumulated URL shapes an episode route can arrive in.
///
/// Older builds of the front-end registered the watch route three different
/// ways; all of them are still reachable from bookmarks, so each shape is a
/// first-class variant instead of a presence check on loose parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum RouteParams {
    /// `/tv-shows/:slug/s:season/e:episode` - prefixed tokens like "s1"/"e1"
    NamedSeasonEpisode {
        slug: String,
        season: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        episode: Option<String>,
    },
    /// `/tv-shows/:slug/:season/:episode` - bare tokens like "1" or "s1"
    GenericSeasonEpisode {
        slug: String,
        season: String,
        episode: String,
    },
    /// No named parameters at all; the raw path is split positionally
    RawPathOnly { path: String },
}

/// Canonical (show, season, episode) reference resolved from a watch URL.
///
/// Constructed fresh on every navigation event and immutable afterwards.
/// `derived_id` is a pre-fetch guess taken from the slug suffix; the
/// backend id on a loaded entity always wins over it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaIdentity {
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_id: Option<String>,
    pub season_number: u32,
    pub episode_number: u32,
}

impl MediaIdentity {
    fn new(slug: &str, season_number: u32, episode_number: u32) -> Self {
        Self {
            slug: slug.to_string(),
            derived_id: derive_id(slug),
            season_number,
            episode_number,
        }
    }

    /// Canonical watch path for this identity.
    pub fn episode_path(&self) -> String {
        format!(
            "/tv-shows/{}/s{}/e{}",
            self.slug, self.season_number, self.episode_number
        )
    }

    /// Identity of the previous episode, if there is one.
    pub fn prev_episode(&self) -> Option<MediaIdentity> {
        if self.episode_number <= 1 {
            return None;
        }
        let mut prev = self.clone();
        prev.episode_number -= 1;
        Some(prev)
    }

    /// Identity of the next episode. Episode counts per season are unknown
    /// without backend data, so this never runs out.
    pub fn next_episode(&self) -> MediaIdentity {
        let mut next = self.clone();
        next.episode_number += 1;
        next
    }
}

/// Resolve any recognized route shape into a canonical identity.
///
/// Pure and total: malformed tokens degrade to season 1 / episode 1 rather
/// than erroring, so a mangled URL still renders a best-effort player.
pub fn resolve(params: &RouteParams) -> MediaIdentity {
    {
        let mut cache = RESOLVE_CACHE.lock().unwrap();
        if let Some(cached) = cache.get(params) {
            return cached.clone();
        }
    }

    let identity = match params {
        RouteParams::NamedSeasonEpisode {
            slug,
            season,
            episode,
        } => {
            let season_number = parse_token(season);
            let episode_number = episode.as_deref().map(parse_token).unwrap_or(1);
            MediaIdentity::new(slug, season_number, episode_number)
        }
        RouteParams::GenericSeasonEpisode {
            slug,
            season,
            episode,
        } => MediaIdentity::new(slug, parse_token(season), parse_token(episode)),
        RouteParams::RawPathOnly { path } => {
            let segments: Vec<&str> = path.split('/').collect();
            let slug = segments.get(SEGMENT_SLUG).copied().unwrap_or("");
            let season_number = segments.get(SEGMENT_SEASON).map_or(1, |s| parse_token(s));
            let episode_number = segments.get(SEGMENT_EPISODE).map_or(1, |s| parse_token(s));
            MediaIdentity::new(slug, season_number, episode_number)
        }
    };

    let mut cache = RESOLVE_CACHE.lock().unwrap();
    cache.put(params.clone(), identity.clone());
    identity
}

/// Classify what a route shape points at.
///
/// The prefixed and generic shapes only ever come from episode routes; a raw
/// path is classified by its first segment and depth.
pub fn kind_of(params: &RouteParams) -> MediaKind {
    match params {
        RouteParams::NamedSeasonEpisode { .. } | RouteParams::GenericSeasonEpisode { .. } => {
            MediaKind::Episode
        }
        RouteParams::RawPathOnly { path } => {
            let segments: Vec<&str> = path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect();
            match segments.first().copied() {
                Some("movies") => MediaKind::Movie,
                _ if segments.len() <= 2 => MediaKind::TvShow,
                _ => MediaKind::Episode,
            }
        }
    }
}

/// Strip every non-digit character and parse what remains.
/// Empty, garbage, or zero all fall back to 1.
fn parse_token(token: &str) -> u32 {
    let digits = NON_DIGITS.replace_all(token, "");
    match digits.parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => 1,
    }
}

/// Extract the numeric backend id most slugs carry as their final dash
/// segment ("breaking-bad-1396" -> "1396"). Non-numeric tails yield None.
fn derive_id(slug: &str) -> Option<String> {
    let last = slug.rsplit('-').next()?;
    if !last.is_empty() && ALL_DIGITS.is_match(last) {
        Some(last.to_string())
    } else {
        None
    }
}
