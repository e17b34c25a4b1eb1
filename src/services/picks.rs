use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{error::AppResult, models::FavoritePick};

/// Storage for users' favorite picks
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PickStore: Send + Sync {
    /// All picks of a user, in the order they were saved. Unknown users have none.
    async fn get_picks(&self, username: &str) -> AppResult<Vec<FavoritePick>>;

    /// Replaces every pick of a user
    async fn save_picks(&self, username: &str, picks: Vec<FavoritePick>) -> AppResult<()>;

    async fn has_picks(&self, username: &str) -> AppResult<bool>;
}

/// Pick store kept in process memory
#[derive(Clone, Default)]
pub struct InMemoryPickStore {
    inner: Arc<RwLock<HashMap<String, Vec<FavoritePick>>>>,
}

impl InMemoryPickStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with picks keyed by username
    pub fn with_picks(picks: HashMap<String, Vec<FavoritePick>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(picks)),
        }
    }

    /// Loads picks from a JSON object of `username -> [pick, ...]`
    ///
    /// A missing file yields an empty store.
    pub async fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Picks file not found, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let picks: HashMap<String, Vec<FavoritePick>> = serde_json::from_str(&raw).map_err(|e| {
            crate::error::AppError::InvalidInput(format!(
                "Malformed picks file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            users = picks.len(),
            "Loaded favorite picks"
        );

        Ok(Self::with_picks(picks))
    }
}

#[async_trait::async_trait]
impl PickStore for InMemoryPickStore {
    async fn get_picks(&self, username: &str) -> AppResult<Vec<FavoritePick>> {
        let inner = self.inner.read().await;
        Ok(inner.get(username).cloned().unwrap_or_default())
    }

    async fn save_picks(&self, username: &str, picks: Vec<FavoritePick>) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.insert(username.to_string(), picks);
        Ok(())
    }

    async fn has_picks(&self, username: &str) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.get(username).is_some_and(|picks| !picks.is_empty()))
    }
}
