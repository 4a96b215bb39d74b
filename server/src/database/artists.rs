use shared::types::{Artist, ArtistInput};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::utils::{generate_id, get_timestamp};
use super::{StoreError, StoreResult, conflict_or};

fn decode(doc: &str) -> StoreResult<Artist> {
    Ok(serde_json::from_str(doc)?)
}

/// All artists ordered by name.
pub async fn list_artists(pool: &SqlitePool) -> StoreResult<Vec<Artist>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT doc FROM artists ORDER BY name COLLATE NOCASE, id")
            .fetch_all(pool)
            .await?;

    rows.iter().map(|(doc,)| decode(doc)).collect()
}

/// Look an artist up by id, falling back to slug. An id match wins over
/// another artist whose slug happens to equal that id.
pub async fn get_artist(pool: &SqlitePool, id_or_slug: &str) -> StoreResult<Option<Artist>> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT doc FROM artists WHERE id = ? OR slug = ? ORDER BY id = ? DESC LIMIT 1",
    )
    .bind(id_or_slug)
    .bind(id_or_slug)
    .bind(id_or_slug)
    .fetch_optional(pool)
    .await?;

    row.map(|(doc,)| decode(&doc)).transpose()
}

pub async fn artist_exists(pool: &SqlitePool, id: &str) -> StoreResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn create_artist(pool: &SqlitePool, input: ArtistInput) -> StoreResult<Artist> {
    let input = input.normalize()?;
    let now = get_timestamp();

    let artist = Artist {
        id: generate_id(),
        slug: input.slug.unwrap_or_default(),
        name: input.name,
        bio: input.bio,
        image_url: input.image_url,
        genres: input.genres,
        links: input.links,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO artists (id, slug, name, doc, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&artist.id)
    .bind(&artist.slug)
    .bind(&artist.name)
    .bind(serde_json::to_string(&artist)?)
    .bind(artist.created_at)
    .bind(artist.updated_at)
    .execute(pool)
    .await
    .map_err(|e| conflict_or(e, || format!("Slug already in use: {}", artist.slug)))?;

    info!("Created artist {} ({})", artist.name, artist.id);
    Ok(artist)
}

/// Replace an artist's editable fields. `id` and `created_at` are kept.
pub async fn update_artist(pool: &SqlitePool, id: &str, input: ArtistInput) -> StoreResult<Artist> {
    let input = input.normalize()?;

    let row: Option<(String,)> = sqlx::query_as("SELECT doc FROM artists WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let existing = match row {
        Some((doc,)) => decode(&doc)?,
        None => return Err(StoreError::NotFound("Artist")),
    };

    let artist = Artist {
        id: existing.id,
        slug: input.slug.unwrap_or(existing.slug),
        name: input.name,
        bio: input.bio,
        image_url: input.image_url,
        genres: input.genres,
        links: input.links,
        created_at: existing.created_at,
        updated_at: get_timestamp(),
    };

    sqlx::query("UPDATE artists SET slug = ?, name = ?, doc = ?, updated_at = ? WHERE id = ?")
        .bind(&artist.slug)
        .bind(&artist.name)
        .bind(serde_json::to_string(&artist)?)
        .bind(artist.updated_at)
        .bind(&artist.id)
        .execute(pool)
        .await
        .map_err(|e| conflict_or(e, || format!("Slug already in use: {}", artist.slug)))?;

    debug!("Updated artist {}", artist.id);
    Ok(artist)
}

/// Delete an artist and every release that belongs to it.
///
/// Returns the number of releases removed alongside the artist.
pub async fn delete_artist(pool: &SqlitePool, id: &str) -> StoreResult<u64> {
    let mut tx = pool.begin().await?;

    let releases = sqlx::query("DELETE FROM releases WHERE artist_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let deleted = sqlx::query("DELETE FROM artists WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        tx.rollback().await?;
        return Err(StoreError::NotFound("Artist"));
    }

    tx.commit().await?;
    info!("Deleted artist {} and {} release(s)", id, releases);
    Ok(releases)
}
