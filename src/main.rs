use std::sync::Arc;
use std::time::Duration;

use cinebase_recs::{
    config::Config,
    db::{create_redis_client, Cache},
    services::{onboarding, InMemoryPickStore, RecommendationService, TmdbProvider},
};
use tracing_subscriber::EnvFilter;

/// Prints recommendations for `<username>` as JSON, or the onboarding
/// options when no username is given.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    let (cache, cache_handle) = match &config.redis_url {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            let (cache, handle) = Cache::new(client).await;
            (cache, Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, upstream responses will not be cached");
            (Cache::disabled(), None)
        }
    };

    let provider = Arc::new(TmdbProvider::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        Duration::from_secs(config.lookup_timeout_secs),
    )?);

    let result = run(&config, provider).await;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    println!("{}", result?);

    Ok(())
}

async fn run(config: &Config, provider: Arc<TmdbProvider>) -> anyhow::Result<String> {
    let output = match std::env::args().nth(1) {
        Some(username) => {
            let store = Arc::new(InMemoryPickStore::from_json_file(&config.picks_file).await?);
            let service = RecommendationService::new(provider, store);
            let items = service.recommendations_for_user(&username).await?;
            serde_json::to_string_pretty(&items)?
        }
        None => {
            let options = onboarding::onboarding_options(provider).await?;
            serde_json::to_string_pretty(&options)?
        }
    };

    Ok(output)
}
