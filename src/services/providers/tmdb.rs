/// TMDB (The Movie Database) v3 provider
///
/// Every lookup reads page-based list endpoints:
/// - `/{movie|tv}/{id}/similar`
/// - `/{movie|tv}/{id}/recommendations`
/// - `/trending/all/day`
/// - `/{movie|tv}/popular`
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ApiMediaItem, CandidateItem, MediaType, PagedResponse},
    services::providers::ContentProvider,
};
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;

const LOOKUP_CACHE_TTL: u64 = 86400; // 1 day
const TRENDING_CACHE_TTL: u64 = 3600; // 1 hour
const POPULAR_CACHE_TTL: u64 = 21600; // 6 hours
const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    /// Creates a provider whose requests fail after `timeout`
    pub fn new(cache: Cache, api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    async fn fetch_page(&self, path: &str, page: u32) -> AppResult<PagedResponse<ApiMediaItem>> {
        let url = format!("{}{}", self.api_url, path);
        let page_param = page.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", LANGUAGE),
                ("page", page_param.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let listing: PagedResponse<ApiMediaItem> = response.json().await?;

        tracing::info!(
            path = %path,
            page = listing.page,
            results = listing.results.len(),
            provider = "tmdb",
            "TMDB list fetched"
        );

        Ok(listing)
    }

    /// Fetches a single-type list and tags entries with `media_type`
    async fn fetch_list(
        &self,
        path: String,
        page: u32,
        media_type: MediaType,
    ) -> AppResult<Vec<CandidateItem>> {
        let response = self.fetch_page(&path, page).await?;
        Ok(response
            .results
            .into_iter()
            .map(|item| item.into_candidate(media_type))
            .collect())
    }

    async fn fetch_mixed_list(&self, path: &str, page: u32) -> AppResult<Vec<CandidateItem>> {
        let response = self.fetch_page(path, page).await?;
        Ok(response
            .results
            .into_iter()
            .filter_map(ApiMediaItem::into_listed_candidate)
            .collect())
    }
}

#[async_trait::async_trait]
impl ContentProvider for TmdbProvider {
    async fn similar(&self, id: u64, media_type: MediaType) -> AppResult<Vec<CandidateItem>> {
        cached!(
            self.cache,
            CacheKey::Similar(media_type, id),
            LOOKUP_CACHE_TTL,
            async move {
                self.fetch_list(format!("/{}/{}/similar", media_type, id), 1, media_type)
                    .await
            }
        )
    }

    async fn recommended(
        &self,
        id: u64,
        media_type: MediaType,
    ) -> AppResult<Vec<CandidateItem>> {
        cached!(
            self.cache,
            CacheKey::Recommended(media_type, id),
            LOOKUP_CACHE_TTL,
            async move {
                self.fetch_list(
                    format!("/{}/{}/recommendations", media_type, id),
                    1,
                    media_type,
                )
                .await
            }
        )
    }

    async fn trending(&self, page: u32) -> AppResult<Vec<CandidateItem>> {
        cached!(
            self.cache,
            CacheKey::Trending(page),
            TRENDING_CACHE_TTL,
            async move { self.fetch_mixed_list("/trending/all/day", page).await }
        )
    }

    async fn popular(&self, media_type: MediaType, page: u32) -> AppResult<Vec<CandidateItem>> {
        cached!(
            self.cache,
            CacheKey::Popular(media_type, page),
            POPULAR_CACHE_TTL,
            async move {
                self.fetch_list(format!("/{}/popular", media_type), page, media_type)
                    .await
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
