// src/store/sqlite.rs
// =============================================================================
// SQLite implementation of the title store.
//
// How it works:
// 1. open() creates the `titles` table if it does not exist yet
// 2. Every call runs on tokio's blocking thread pool (rusqlite is synchronous)
// 3. Every upsert runs in its own transaction
//
// Connection handling:
// - One connection behind a mutex, shared by all workers and HTTP handlers
// - SQLite serializes writers anyway; busy_timeout covers other processes
//   holding the file lock
//
// Rust concepts:
// - Arc<Mutex<T>>: shared ownership + exclusive access across threads
// - spawn_blocking: run blocking code without stalling async tasks
// - Closures with move: hand owned data to another thread
// =============================================================================

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use super::{FetchRecord, StoreError, TitleSink, MAX_FIELD_CHARS};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS titles (
    url       VARCHAR(255) PRIMARY KEY,
    title     VARCHAR(255),
    timestamp INTEGER
)
"#;

const UPSERT_SQL: &str = r#"
INSERT INTO titles (url, title, timestamp) VALUES (?1, ?2, ?3)
ON CONFLICT (url) DO UPDATE
    SET title     = excluded.title,
        timestamp = excluded.timestamp
"#;

const SELECT_ALL_SQL: &str = "SELECT url, title, timestamp FROM titles ORDER BY rowid";

// How long to wait for a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and bootstraps the schema
    ///
    /// The special path `:memory:` gives a private in-memory database.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if path == Path::new(":memory:") {
            return Self::in_memory();
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// A fresh in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(CREATE_TABLE_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Runs `f` with exclusive access to the connection on a blocking thread
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut guard)
        })
        .await?
    }
}

#[async_trait]
impl TitleSink for SqliteStore {
    async fn upsert(&self, record: &FetchRecord) -> Result<(), StoreError> {
        let url_chars = record.url.chars().count();
        if url_chars > MAX_FIELD_CHARS {
            return Err(StoreError::UrlTooLong(url_chars));
        }

        let url = record.url.clone();
        let title = truncate_chars(&record.title, MAX_FIELD_CHARS).to_string();
        let timestamp = record.timestamp;

        self.with_conn(move |conn| {
            // Dropping an uncommitted transaction rolls it back
            let tx = conn.transaction()?;
            tx.execute(UPSERT_SQL, params![url, title, timestamp])?;
            tx.commit()?;
            debug!(url = %url, "title row upserted");
            Ok(())
        })
        .await
    }

    async fn query_all(&self) -> Result<Vec<FetchRecord>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(SELECT_ALL_SQL)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(FetchRecord {
                        url: row.get(0)?,
                        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        timestamp: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }
}

// Cuts a string to at most `max` characters without splitting a character
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
