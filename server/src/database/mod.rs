use std::str::FromStr;

use shared::types::ValidationError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

pub mod artists;
pub mod create;
pub mod releases;
pub mod streams;
pub mod utils;

pub use create::create_tables;

/// Document store failures, mapped to HTTP statuses by the handlers.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// A document points at another document that does not exist.
    #[error("{0}")]
    MissingReference(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored document is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open a pool for `url`, creating the database file if needed.
///
/// An in-memory database lives only as long as its connection, so it gets a
/// single connection that is never recycled.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if is_memory_url(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?
    };

    info!("Connected to database {}", url);
    Ok(pool)
}

/// Fresh in-memory database with the schema applied.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = connect("sqlite::memory:", 1).await?;
    create_tables(&pool).await?;
    Ok(pool)
}

/// Map a unique-constraint failure to `Conflict`, everything else to `Database`.
fn conflict_or(e: sqlx::Error, message: impl FnOnce() -> String) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message()),
        _ => StoreError::Database(e),
    }
}

/// Map a foreign-key failure to `MissingReference`, everything else to `Database`.
///
/// Covers a referenced row vanishing between the existence check and the write.
fn missing_reference_or(e: sqlx::Error, message: impl FnOnce() -> String) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::MissingReference(message())
        }
        _ => StoreError::Database(e),
    }
}
