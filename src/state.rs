use std::sync::Arc;

use crate::config::Config;
use crate::counter::CounterStore;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    /// View counters and ranking, injected so tests can swap the backend.
    pub counters: Arc<dyn CounterStore>,
    pub templates: Arc<Tera>,
    /// Client used to download bookmarked images.
    pub http: reqwest::Client,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
