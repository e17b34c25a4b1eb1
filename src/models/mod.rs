use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod favorite_pick;
pub mod genre;

pub use favorite_pick::{FavoritePick, PickItem, SavePicksRequest};

/// Kind of catalog entry; TMDB serves movies and TV shows from separate endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used by the TMDB API
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    /// Parses TMDB's `media_type` field. People and other kinds yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Tv),
            _ => None,
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A movie or TV show proposed by the upstream catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateItem {
    /// TMDB id
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    /// Raw TMDB genre codes, see [`genre`]
    pub genre_ids: Vec<u32>,
    /// Average user rating, 0-10
    pub vote_average: f64,
    pub vote_count: u64,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
}

/// Popular title offered on the onboarding screen
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OnboardingOption {
    pub tmdb_id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub vote_average: f64,
    pub genres: Vec<String>,
}

impl From<CandidateItem> for OnboardingOption {
    fn from(item: CandidateItem) -> Self {
        Self {
            tmdb_id: item.id,
            media_type: item.media_type,
            genres: genre::display_genre_names(&item.genre_ids),
            title: item.title,
            poster_path: item.poster_path,
            overview: item.overview,
            vote_average: item.vote_average,
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Paginated list envelope returned by TMDB list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// Raw list entry from TMDB
///
/// Movies carry `title`/`release_date`, TV shows carry `name`/`first_air_date`.
/// Mixed lists (trending) also carry `media_type`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMediaItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl ApiMediaItem {
    /// Converts an entry from a single-type list, where the media type comes from the query
    pub fn into_candidate(self, media_type: MediaType) -> CandidateItem {
        let title = match media_type {
            MediaType::Movie => self.title.or(self.name),
            MediaType::Tv => self.name.or(self.title),
        }
        .unwrap_or_default();

        CandidateItem {
            id: self.id,
            media_type,
            title,
            genre_ids: self.genre_ids,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            overview: self.overview,
            poster_path: self.poster_path,
        }
    }

    /// Converts an entry from a mixed list using its own `media_type`
    pub fn into_listed_candidate(self) -> Option<CandidateItem> {
        let media_type = self.media_type.as_deref().and_then(MediaType::parse)?;
        Some(self.into_candidate(media_type))
    }
}
