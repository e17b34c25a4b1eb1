use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::MediaType;

/// A favorite movie or TV show chosen by a user during onboarding
///
/// Picks seed the personalised recommendation feed. A user holds at most one
/// pick per `(tmdb_id, media_type)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoritePick {
    pub tmdb_id: u64,
    pub media_type: MediaType,
    pub title: String,
    /// Genre names resolved when the pick was saved
    #[serde(default, deserialize_with = "deserialize_genre_tags")]
    pub genres: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl FavoritePick {
    pub fn new(tmdb_id: u64, media_type: MediaType, title: String, genres: Vec<String>) -> Self {
        Self {
            tmdb_id,
            media_type,
            title,
            genres,
            created_at: Utc::now(),
        }
    }
}

/// Request body for replacing a user's picks
#[derive(Debug, Clone, Deserialize)]
pub struct SavePicksRequest {
    pub picks: Vec<PickItem>,
}

/// One pick as submitted from the onboarding screen
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickItem {
    pub tmdb_id: u64,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_genre_tags")]
    pub genres: Vec<String>,
}

impl From<PickItem> for FavoritePick {
    fn from(item: PickItem) -> Self {
        FavoritePick::new(item.tmdb_id, item.media_type, item.title, item.genres)
    }
}

/// Accepted encodings of a genre tag list
#[derive(Deserialize)]
#[serde(untagged)]
enum GenreTags {
    List(Vec<String>),
    /// Legacy storage format: the list serialised into a string
    Encoded(String),
    Other(serde::de::IgnoredAny),
}

/// Deserializes genre tags leniently. Null, malformed, or empty input all
/// become an empty list.
fn deserialize_genre_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match GenreTags::deserialize(deserializer)? {
        GenreTags::List(tags) => tags,
        GenreTags::Encoded(raw) => parse_genre_tags(&raw),
        GenreTags::Other(_) => Vec::new(),
    };

    Ok(tags)
}

/// Parses a genre list stored as an array string, e.g. `["Action","Drama"]`
///
/// Bracketed lists that are not valid JSON (`[Action, Drama]`) are split on
/// commas with surrounding quotes trimmed. Anything else yields no tags.
pub fn parse_genre_tags(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if let Ok(tags) = serde_json::from_str::<Vec<String>>(raw) {
        return tags;
    }

    let Some(content) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) else {
        return Vec::new();
    };

    content
        .split(',')
        .map(|tag| tag.trim().trim_matches('"').trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
