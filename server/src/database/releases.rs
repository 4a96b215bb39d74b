use shared::types::{Release, ReleaseInput, ValidRelease};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::artists::artist_exists;
use super::utils::{generate_id, get_timestamp};
use super::{StoreError, StoreResult, missing_reference_or};

fn decode(doc: &str) -> StoreResult<Release> {
    Ok(serde_json::from_str(doc)?)
}

fn decode_all(rows: Vec<(String,)>) -> StoreResult<Vec<Release>> {
    rows.iter().map(|(doc,)| decode(doc)).collect()
}

/// Releases newest first, optionally restricted to one artist.
pub async fn list_releases(pool: &SqlitePool, artist_id: Option<&str>) -> StoreResult<Vec<Release>> {
    let rows: Vec<(String,)> = match artist_id {
        Some(artist_id) => {
            sqlx::query_as(
                "SELECT doc FROM releases WHERE artist_id = ? ORDER BY release_date DESC, created_at DESC, id",
            )
            .bind(artist_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT doc FROM releases ORDER BY release_date DESC, created_at DESC, id",
            )
            .fetch_all(pool)
            .await?
        }
    };

    decode_all(rows)
}

pub async fn get_release(pool: &SqlitePool, id: &str) -> StoreResult<Option<Release>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT doc FROM releases WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|(doc,)| decode(&doc)).transpose()
}

async fn require_artist(pool: &SqlitePool, valid: &ValidRelease) -> StoreResult<()> {
    if artist_exists(pool, &valid.artist_id).await? {
        Ok(())
    } else {
        Err(StoreError::MissingReference(unknown_artist(&valid.artist_id)))
    }
}

fn unknown_artist(artist_id: &str) -> String {
    format!("Unknown artist_id: {}", artist_id)
}

pub async fn create_release(pool: &SqlitePool, input: ReleaseInput) -> StoreResult<Release> {
    let valid = input.validate()?;
    require_artist(pool, &valid).await?;
    let now = get_timestamp();

    let release = Release {
        id: generate_id(),
        artist_id: valid.artist_id,
        title: valid.title,
        release_type: valid.release_type,
        release_date: valid.release_date,
        cover_url: valid.cover_url,
        tracks: valid.tracks,
        links: valid.links,
        created_at: now,
        updated_at: now,
    };

    insert_release(pool, &release).await?;

    info!("Created release {} ({})", release.title, release.id);
    Ok(release)
}

async fn insert_release(pool: &SqlitePool, release: &Release) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO releases (id, artist_id, release_date, doc, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&release.id)
    .bind(&release.artist_id)
    .bind(release.release_date.format("%Y-%m-%d").to_string())
    .bind(serde_json::to_string(release)?)
    .bind(release.created_at)
    .bind(release.updated_at)
    .execute(pool)
    .await
    .map_err(|e| missing_reference_or(e, || unknown_artist(&release.artist_id)))?;
    Ok(())
}

/// Replace a release's editable fields. `id` and `created_at` are kept.
pub async fn update_release(pool: &SqlitePool, id: &str, input: ReleaseInput) -> StoreResult<Release> {
    let valid = input.validate()?;

    let existing = get_release(pool, id)
        .await?
        .ok_or(StoreError::NotFound("Release"))?;
    require_artist(pool, &valid).await?;

    let release = Release {
        id: existing.id,
        artist_id: valid.artist_id,
        title: valid.title,
        release_type: valid.release_type,
        release_date: valid.release_date,
        cover_url: valid.cover_url,
        tracks: valid.tracks,
        links: valid.links,
        created_at: existing.created_at,
        updated_at: get_timestamp(),
    };

    sqlx::query(
        "UPDATE releases SET artist_id = ?, release_date = ?, doc = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&release.artist_id)
    .bind(release.release_date.format("%Y-%m-%d").to_string())
    .bind(serde_json::to_string(&release)?)
    .bind(release.updated_at)
    .bind(&release.id)
    .execute(pool)
    .await
    .map_err(|e| missing_reference_or(e, || unknown_artist(&release.artist_id)))?;

    debug!("Updated release {}", release.id);
    Ok(release)
}

pub async fn delete_release(pool: &SqlitePool, id: &str) -> StoreResult<()> {
    let deleted = sqlx::query("DELETE FROM releases WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(StoreError::NotFound("Release"));
    }
    info!("Deleted release {}", id);
    Ok(())
}
