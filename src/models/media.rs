use serde::{Deserialize, Serialize};

/// What a watch route points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    Movie,
    TvShow,
    Episode,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::TvShow => write!(f, "tv-show"),
            MediaKind::Episode => write!(f, "episode"),
        }
    }
}

/// Movie entity as returned by the catalog backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
}

/// TV show entity as returned by the catalog backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvShow {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
}

/// Episode sub-object nested inside an episode lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub still_path: Option<String>,
}

/// Episode lookup response: the show and the episode ride along together.
/// Either half can be missing when the backend has partial data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv_show: Option<TvShow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<EpisodeSummary>,
}

/// The entity a watch session currently holds, whichever lookup produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MediaEntity {
    Movie(Movie),
    TvShow(TvShow),
    Episode(EpisodeDetails),
}

impl MediaEntity {
    /// Backend id usable for player URLs. For episodes the show id is the
    /// one the providers address by.
    pub fn authoritative_id(&self) -> Option<i64> {
        match self {
            MediaEntity::Movie(movie) => Some(movie.id),
            MediaEntity::TvShow(show) => Some(show.id),
            MediaEntity::Episode(details) => details.tv_show.as_ref().map(|show| show.id),
        }
    }

    /// Display title, falling back through the nested objects for episodes
    pub fn title(&self) -> Option<&str> {
        match self {
            MediaEntity::Movie(movie) => Some(movie.title.as_str()),
            MediaEntity::TvShow(show) => Some(show.name.as_str()),
            MediaEntity::Episode(details) => details
                .episode
                .as_ref()
                .and_then(|episode| episode.name.as_deref())
                .or_else(|| details.tv_show.as_ref().map(|show| show.name.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(id: i64, name: &str) -> TvShow {
        TvShow {
            id,
            name: name.to_string(),
            slug: None,
            first_air_date: None,
            rating: None,
            overview: None,
            poster_path: None,
            backdrop_path: None,
        }
    }

    #[test]
    fn test_authoritative_id_for_episode_is_show_id() {
        let entity = MediaEntity::Episode(EpisodeDetails {
            tv_show: Some(show(1396, "Breaking Bad")),
            episode: Some(EpisodeSummary {
                id: Some(62085),
                name: Some("Pilot".to_string()),
                season_number: Some(1),
                episode_number: Some(1),
                air_date: None,
                overview: None,
                still_path: None,
            }),
        });
        assert_eq!(entity.authoritative_id(), Some(1396));
        assert_eq!(entity.title(), Some("Pilot"));
    }

    #[test]
    fn test_episode_without_show_has_no_id() {
        let entity = MediaEntity::Episode(EpisodeDetails {
            tv_show: None,
            episode: None,
        });
        assert_eq!(entity.authoritative_id(), None);
        assert_eq!(entity.title(), None);
    }

    #[test]
    fn test_episode_decodes_backend_shape() {
        let details: EpisodeDetails = serde_json::from_str(
            r#"{
                "tv_show": {"id": 1396, "name": "Breaking Bad", "first_air_date": "2008-01-20"},
                "episode": {"name": "Pilot", "season_number": 1, "episode_number": 1, "overview": "A teacher turns to cooking."}
            }"#,
        )
        .unwrap();
        assert_eq!(details.tv_show.unwrap().id, 1396);
        assert_eq!(details.episode.unwrap().name.as_deref(), Some("Pilot"));
    }
}
