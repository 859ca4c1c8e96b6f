//! Application state: the injected store and a few settings handlers need.
//!
//! Store calls are synchronous (rusqlite), so handlers go through
//! `AppState::with_store`, which runs them on tokio's blocking pool.

use std::sync::Arc;

use tracing::instrument;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::store::{Store, StoreResult};

/// Hard ceiling for `?limit=` on the leaderboard.
pub const MAX_HIGHSCORE_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub highscore_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, cfg: &AppConfig) -> Self {
        Self {
            store,
            highscore_limit: cfg.highscore_limit.clamp(1, MAX_HIGHSCORE_LIMIT),
        }
    }

    /// Run a store operation off the async executor.
    #[instrument(level = "trace", skip_all)]
    pub async fn with_store<T, F>(&self, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Store) -> StoreResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        let out = tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| AppError::Internal(format!("store task failed: {e}")))?;
        Ok(out?)
    }
}
