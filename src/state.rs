use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::photo_store::PhotoStore;
use crate::services::push_service::PushRelay;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub photos: PhotoStore,
    pub push_relay: PushRelay,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let photos = PhotoStore::new(config.upload_dir.clone());
        let push_relay = PushRelay::new(config.push_relay_url.clone(), config.push_relay_key.clone());
        Self {
            pool,
            config: Arc::new(config),
            photos,
            push_relay,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
