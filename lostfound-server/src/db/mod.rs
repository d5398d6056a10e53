//! Database module
//!
//! Provides the ledger store backend:
//! - **PostgreSQL** when `DATABASE_URL` is set
//! - **Memory** otherwise (development only, data is lost on restart)

mod postgres;

pub use postgres::PostgresStore;

use std::sync::Arc;

use lostfound_core::{LedgerStore, MemoryStore, StoreResult};

use crate::config::Config;

/// Open the configured store, falling back to memory without `DATABASE_URL`.
pub async fn store_from_config(config: &Config) -> StoreResult<Arc<dyn LedgerStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(
                url,
                config.database_max_connections,
                config.database_min_connections,
            )
            .await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage - data will be lost on restart!");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
