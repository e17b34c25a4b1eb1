use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{FavoritePick, MediaType, OnboardingOption, SavePicksRequest},
    services::{picks::PickStore, providers::ContentProvider},
};

/// Options shown per media type on the onboarding screen
pub const OPTIONS_PER_MEDIA_TYPE: usize = 10;

/// Popular movies followed by popular TV shows for users to pick favorites from
pub async fn onboarding_options(
    provider: Arc<dyn ContentProvider>,
) -> AppResult<Vec<OnboardingOption>> {
    let (movies, shows) = tokio::try_join!(
        provider.popular(MediaType::Movie, 1),
        provider.popular(MediaType::Tv, 1),
    )?;

    Ok(movies
        .into_iter()
        .take(OPTIONS_PER_MEDIA_TYPE)
        .chain(shows.into_iter().take(OPTIONS_PER_MEDIA_TYPE))
        .map(OnboardingOption::from)
        .collect())
}

/// Whether the user has saved any favorite picks
pub async fn has_completed_onboarding(
    store: Arc<dyn PickStore>,
    username: &str,
) -> AppResult<bool> {
    store.has_picks(username).await
}

/// Replaces the user's favorite picks, returning how many were saved
pub async fn save_picks(
    store: Arc<dyn PickStore>,
    username: &str,
    request: SavePicksRequest,
) -> AppResult<usize> {
    let mut seen = HashSet::new();
    for item in &request.picks {
        if item.title.trim().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Pick {} ({}) has no title",
                item.tmdb_id, item.media_type
            )));
        }
        if !seen.insert((item.tmdb_id, item.media_type)) {
            return Err(AppError::InvalidInput(format!(
                "Duplicate pick {} ({})",
                item.tmdb_id, item.media_type
            )));
        }
    }

    let picks: Vec<FavoritePick> = request.picks.into_iter().map(FavoritePick::from).collect();
    let count = picks.len();

    store.save_picks(username, picks).await?;

    tracing::info!(user = %username, picks = count, "Favorite picks saved");

    Ok(count)
}
