/// Upstream catalog abstraction
///
/// The recommendation engine only needs candidate lists from the catalog, so
/// providers expose list lookups keyed by external id and media type.
use crate::{
    error::AppResult,
    models::{CandidateItem, MediaType},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for movie/TV metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    /// Titles similar to the given one (genres, keywords, cast)
    async fn similar(&self, id: u64, media_type: MediaType) -> AppResult<Vec<CandidateItem>>;

    /// Titles the provider recommends for viewers of the given one
    async fn recommended(&self, id: u64, media_type: MediaType)
        -> AppResult<Vec<CandidateItem>>;

    /// Movies and TV shows trending today, used when a user has no picks
    async fn trending(&self, page: u32) -> AppResult<Vec<CandidateItem>>;

    /// Popular titles of one media type
    async fn popular(&self, media_type: MediaType, page: u32) -> AppResult<Vec<CandidateItem>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
