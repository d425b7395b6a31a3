//! Embedded player source selection
//!
//! Builds provider iframe URLs from a resolved identity and tracks
//! per-source load state. Fallback is explicit: a failed source stays on
//! screen with a switch affordance, it is never swapped silently.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::media::MediaKind;

const VIDSRC_BASE: &str = "https://vidsrc.xyz";
const TWOEMBED_BASE: &str = "https://www.2embed.cc";

/// Known embedded video providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoSource {
    #[serde(rename = "vidsrc")]
    VidSrc,
    #[serde(rename = "2embed")]
    TwoEmbed,
}

impl VideoSource {
    /// Build the provider embed URL for an identity.
    ///
    /// The two providers use different conventions: VidSrc joins season and
    /// episode as a dashed path segment, 2Embed appends them as query-style
    /// parameters.
    pub fn embed_url(&self, kind: MediaKind, id: &str, season: u32, episode: u32) -> String {
        match (self, kind) {
            (VideoSource::VidSrc, MediaKind::Movie) => {
                format!("{}/embed/movie/{}", VIDSRC_BASE, id)
            }
            (VideoSource::VidSrc, _) => {
                format!("{}/embed/tv/{}/{}-{}", VIDSRC_BASE, id, season, episode)
            }
            (VideoSource::TwoEmbed, MediaKind::Movie) => {
                format!("{}/embed/{}", TWOEMBED_BASE, id)
            }
            (VideoSource::TwoEmbed, _) => {
                format!("{}/embedtv/{}&s={}&e={}", TWOEMBED_BASE, id, season, episode)
            }
        }
    }

    /// Human-readable provider name for UI affordances
    pub fn label(&self) -> &'static str {
        match self {
            VideoSource::VidSrc => "VidSrc",
            VideoSource::TwoEmbed => "2Embed",
        }
    }
}

/// Per-source load lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Which provider is active and how each configured provider is doing.
///
/// Invariant: `active` is always a member of `order`; an empty `order`
/// means playback is unavailable and `active` is None.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    active: Option<VideoSource>,
    order: Vec<VideoSource>,
    status: HashMap<VideoSource, SourceStatus>,
}

impl SourceSelection {
    pub fn new(order: Vec<VideoSource>) -> Self {
        let active = order.first().copied();
        let status = order
            .iter()
            .map(|source| (*source, SourceStatus::Idle))
            .collect();
        Self {
            active,
            order,
            status,
        }
    }

    pub fn active(&self) -> Option<VideoSource> {
        self.active
    }

    pub fn active_status(&self) -> Option<SourceStatus> {
        self.active.map(|source| self.status[&source])
    }

    /// True when no provider is configured at all
    pub fn is_unavailable(&self) -> bool {
        self.order.is_empty()
    }

    /// A new identity is being loaded. The viewer's provider choice is kept,
    /// but every per-source verdict belongs to the previous identity and is
    /// wiped; the active source starts loading again.
    pub fn reset_for_navigation(&mut self) {
        for status in self.status.values_mut() {
            *status = SourceStatus::Idle;
        }
        if let Some(active) = self.active {
            self.status.insert(active, SourceStatus::Loading);
        }
    }

    /// The embedded frame for the active source finished loading
    pub fn report_ready(&mut self) {
        if let Some(active) = self.active {
            self.status.insert(active, SourceStatus::Ready);
        }
    }

    /// The embedded frame for the active source failed to load. Only marks
    /// the source; switching stays a user decision.
    pub fn report_failed(&mut self) {
        if let Some(active) = self.active {
            self.status.insert(active, SourceStatus::Failed);
        }
    }

    /// Retry the active source without changing providers
    pub fn retry_active(&mut self) {
        if let Some(active) = self.active {
            self.status.insert(active, SourceStatus::Loading);
        }
    }

    /// Switch to the next configured provider, cycling through `order`.
    /// The new source starts in `Loading` with its error state cleared.
    /// Returns None when no provider is configured.
    pub fn switch_next(&mut self) -> Option<VideoSource> {
        let current = self.active?;
        let position = self.order.iter().position(|source| *source == current)?;
        let next = self.order[(position + 1) % self.order.len()];
        self.active = Some(next);
        self.status.insert(next, SourceStatus::Loading);
        Some(next)
    }
}
