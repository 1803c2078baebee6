//! Row store layer for careerscope
//!
//! The dashboard reads three tables (`achievements`, `daily_wins`,
//! `profiles`) through the [`RowStore`] trait:
//! - [`PostgrestStore`] talks to a PostgREST-compatible HTTP API
//! - [`SqliteStore`] reads a local SQLite mirror of the same tables
//!
//! Queries are described once with [`Query`] and translated by each backend.

mod postgrest;
pub mod query;
pub mod schema;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{Error, Result};

pub use postgrest::PostgrestStore;
pub use query::{Filter, FilterOp, FilterValue, Query, QueryResult, Table};
pub use sqlite::SqliteStore;

/// Read access to a row-oriented store.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Run a query and return its rows and, if requested, its exact count.
    async fn fetch(&self, query: &Query) -> Result<QueryResult>;

    /// Run a query that must match at least one row and return the first.
    async fn fetch_single(&self, query: &Query) -> Result<serde_json::Value> {
        self.fetch(query)
            .await?
            .rows
            .into_iter()
            .next()
            .ok_or(Error::NotFound {
                table: query.table.as_str(),
            })
    }
}

/// Open the configured backend.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn RowStore>> {
    config.validate()?;

    match config.backend {
        StoreBackend::Postgrest => {
            let store = PostgrestStore::new(config)?;
            tracing::info!(url = %store.base_url(), "Using PostgREST row store");
            Ok(Arc::new(store))
        }
        StoreBackend::Sqlite => {
            let path = config.resolved_sqlite_path();
            tracing::info!(path = %path.display(), "Using SQLite row store");
            let store = SqliteStore::open(&path)?;
            store.migrate()?;
            Ok(Arc::new(store))
        }
    }
}
