// src/store/mod.rs
// =============================================================================
// This module stores fetched titles and reads them back.
//
// Submodules:
// - sqlite: The SQLite-backed implementation (table `titles`)
//
// The worker pool and the HTTP layer only see the TitleSink trait, so the
// storage engine can be swapped without touching them.
// =============================================================================

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest url/title the `titles` table accepts (VARCHAR(255))
pub const MAX_FIELD_CHARS: usize = 255;

/// One row of the `titles` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRecord {
    pub url: String,
    pub title: String,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
}

impl FetchRecord {
    /// Builds a record stamped with the current time
    pub fn now(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            timestamp: Utc::now().timestamp(),
        }
    }

    /// The timestamp as a UTC date-time (for display)
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("url is {0} characters long, the limit is {MAX_FIELD_CHARS}")]
    UrlTooLong(usize),

    #[error("database connection lock was poisoned")]
    Poisoned,

    #[error("database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Durable storage for fetch results
///
/// Every call is its own transaction: an upsert either commits fully or
/// returns an error with nothing written.
#[async_trait]
pub trait TitleSink: Send + Sync {
    /// Inserts the record, or replaces the row with the same url
    async fn upsert(&self, record: &FetchRecord) -> Result<(), StoreError>;

    /// Every stored record, in storage order
    async fn query_all(&self) -> Result<Vec<FetchRecord>, StoreError>;
}
