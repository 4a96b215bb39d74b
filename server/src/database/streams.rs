use chrono::NaiveDate;
use shared::types::{MAX_STREAM_COUNT, StreamFilter, StreamRecord, ValidationError};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use super::{StoreError, StoreResult};

#[derive(FromRow)]
struct StreamRow {
    day: String,
    platform: String,
    count: i64,
    release_id: Option<String>,
}

fn day_text(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

impl StreamRow {
    fn into_record(self) -> Option<StreamRecord> {
        // Rows are only ever written by `insert_streams`; skip anything that
        // was edited into an unreadable shape by hand.
        let day = NaiveDate::parse_from_str(&self.day, "%Y-%m-%d").ok()?;
        Some(StreamRecord {
            day,
            platform: self.platform,
            count: u64::try_from(self.count).unwrap_or(0),
            release_id: self.release_id,
        })
    }
}

fn stored_count(count: u64) -> StoreResult<i64> {
    i64::try_from(count).map_err(|_| {
        StoreError::Invalid(ValidationError::OutOfRange {
            field: "count",
            max: MAX_STREAM_COUNT,
        })
    })
}

/// Insert every record in one transaction. Returns the number inserted.
pub async fn insert_streams(pool: &SqlitePool, records: &[StreamRecord]) -> StoreResult<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for record in records {
        inserted += sqlx::query(
            "INSERT INTO streams (day, platform, count, release_id) VALUES (?, ?, ?, ?)",
        )
        .bind(day_text(record.day))
        .bind(&record.platform)
        .bind(stored_count(record.count)?)
        .bind(record.release_id.as_deref())
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    info!("Recorded {} stream row(s)", inserted);
    Ok(inserted)
}

/// Records matching `filter`, date range inclusive, ordered by day.
pub async fn query_streams(pool: &SqlitePool, filter: &StreamFilter) -> StoreResult<Vec<StreamRecord>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT day, platform, count, release_id FROM streams WHERE 1 = 1");

    if let Some(from) = filter.from {
        qb.push(" AND day >= ").push_bind(day_text(from));
    }
    if let Some(to) = filter.to {
        qb.push(" AND day <= ").push_bind(day_text(to));
    }
    if let Some(release_id) = &filter.release_id {
        qb.push(" AND release_id = ").push_bind(release_id.clone());
    }
    if let Some(platform) = &filter.platform {
        qb.push(" AND platform = ").push_bind(platform.clone());
    }
    qb.push(" ORDER BY day, platform");

    let rows: Vec<StreamRow> = qb.build_query_as().fetch_all(pool).await?;
    debug!("Loaded {} stream row(s) for {:?}", rows.len(), filter);

    Ok(rows.into_iter().filter_map(StreamRow::into_record).collect())
}
