//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use lostfound_core::{ClaimEngine, ItemRegistry, LedgerStore, MediaBatch, MediaUploader};

use crate::auth::TokenVerifier;
use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Ledger storage (PostgreSQL or in-memory)
    pub store: Arc<dyn LedgerStore>,
    /// Lost and found reports
    pub items: ItemRegistry,
    /// Claim lifecycle
    pub claims: ClaimEngine,
    /// Identity token validation
    pub tokens: Arc<TokenVerifier>,
    /// Startup configuration
    pub config: Arc<Config>,
    /// Maximum size of a single uploaded file in bytes
    pub max_file_size: usize,
    /// Name of the configured media provider
    pub media_provider: &'static str,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        uploader: Arc<dyn MediaUploader>,
        config: &Config,
    ) -> Self {
        let media_provider = uploader.name();
        let media = MediaBatch::new(
            uploader,
            config.media_root_folder.clone(),
            config.upload_timeout(),
        );

        Self {
            items: ItemRegistry::new(store.clone(), media.clone()),
            claims: ClaimEngine::new(store.clone(), media),
            store,
            tokens: Arc::new(TokenVerifier::new(&config.jwt_secret)),
            config: Arc::new(config.clone()),
            max_file_size: config.max_file_size(),
            media_provider,
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.config.is_admin_email(email)
    }
}
