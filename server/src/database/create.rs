use sqlx::SqlitePool;
use tracing::info;

/// Current schema version.  Bump this whenever the schema changes and add a
/// corresponding migration arm in `run_migrations`.
const SCHEMA_VERSION: i64 = 1;

/// Initialize the database schema and run any pending migrations.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    create_schema(pool).await?;
    run_migrations(pool).await?;
    Ok(())
}

/// Create all tables for a brand-new database.
async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Documents are stored whole as JSON; the other columns exist for
    // lookups, uniqueness and ordering.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS artists (
            id         TEXT    PRIMARY KEY,
            slug       TEXT    NOT NULL UNIQUE,
            name       TEXT    NOT NULL,
            doc        TEXT    NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS releases (
            id           TEXT    PRIMARY KEY,
            artist_id    TEXT    NOT NULL,
            release_date TEXT    NOT NULL,
            doc          TEXT    NOT NULL,
            created_at   INTEGER NOT NULL,
            updated_at   INTEGER NOT NULL,
            FOREIGN KEY (artist_id) REFERENCES artists(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS streams (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            day        TEXT    NOT NULL,
            platform   TEXT    NOT NULL,
            count      INTEGER NOT NULL,
            release_id TEXT
        )",
    )
    .execute(pool)
    .await?;

    // --- Indexes --------------------------------------------------------
    for stmt in [
        "CREATE INDEX IF NOT EXISTS idx_artists_name        ON artists(name)",
        "CREATE INDEX IF NOT EXISTS idx_releases_artist     ON releases(artist_id)",
        "CREATE INDEX IF NOT EXISTS idx_releases_date       ON releases(release_date)",
        "CREATE INDEX IF NOT EXISTS idx_streams_day         ON streams(day)",
        "CREATE INDEX IF NOT EXISTS idx_streams_release_day ON streams(release_id, day)",
    ] {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}

/// Apply any schema migrations required to reach `SCHEMA_VERSION`.
///
/// Uses `PRAGMA user_version` as the migration counter.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let current_version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Database schema at version {}; target version {}.",
        current_version, SCHEMA_VERSION
    );

    // PRAGMA does not take bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(pool)
        .await?;

    info!("Schema version set to {}.", SCHEMA_VERSION);
    Ok(())
}
