use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::{AuthProvider, SessionManager};
use crate::core::config::AppConfig;
use crate::drive::BlobStore;
use crate::store::RecordStore;

/// Shared application state handed to every view at construction. All
/// backends sit behind trait objects so tests run against in-memory fakes.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn RecordStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub blob: Arc<dyn BlobStore>,
    pub sessions: SessionManager,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn RecordStore>,
        auth: Arc<dyn AuthProvider>,
        blob: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config,
            store,
            auth,
            blob,
            sessions: SessionManager::new(),
            shutdown: CancellationToken::new(),
        }
    }
}
