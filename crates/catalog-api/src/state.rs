//! Shared application state.

use std::sync::Arc;

use catalog_core::ImageLifecycleManager;
use catalog_db::Database;

use crate::config::ServerConfig;
use crate::csrf::CsrfTokens;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub lifecycle: ImageLifecycleManager,
    pub csrf: CsrfTokens,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            db,
            lifecycle: ImageLifecycleManager::new(config.max_upload_size_bytes),
            csrf: CsrfTokens::new(config.csrf_secret.clone()),
            config: Arc::new(config),
        }
    }
}
