use sqlx::PgPool;

use radar_common::SourceStatus;

use crate::error::StoreResult;
use crate::models::{Source, SourceRow};

pub struct NewSource {
    pub source_id: String,
    pub display_name: String,
    pub url: String,
    pub feed_url: Option<String>,
    pub fetch_method: String,
    pub language: String,
    pub tier: i16,
    pub reliability: f64,
    pub earliness: f64,
    pub schedule_minutes: i32,
    pub layers: Vec<String>,
    pub search_queries: Vec<String>,
    pub status: String,
}

/// Inserts a seed source, or updates the mutable fields of an existing
/// one. Seed loading is idempotent: re-running it against an unchanged
/// seed file is a no-op.
pub async fn upsert_seed(pool: &PgPool, s: NewSource) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sources
            (source_id, display_name, url, feed_url, fetch_method, language,
             tier, reliability, earliness, schedule_minutes, layers, search_queries, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (source_id) DO UPDATE SET
            display_name = EXCLUDED.display_name,
            url = EXCLUDED.url,
            feed_url = EXCLUDED.feed_url,
            fetch_method = EXCLUDED.fetch_method,
            language = EXCLUDED.language,
            tier = EXCLUDED.tier,
            reliability = EXCLUDED.reliability,
            earliness = EXCLUDED.earliness,
            schedule_minutes = EXCLUDED.schedule_minutes,
            layers = EXCLUDED.layers,
            search_queries = EXCLUDED.search_queries,
            updated_at = now()
        "#,
    )
    .bind(&s.source_id)
    .bind(&s.display_name)
    .bind(&s.url)
    .bind(&s.feed_url)
    .bind(&s.fetch_method)
    .bind(&s.language)
    .bind(s.tier)
    .bind(s.reliability)
    .bind(s.earliness)
    .bind(s.schedule_minutes)
    .bind(&s.layers)
    .bind(&s.search_queries)
    .bind(&s.status)
    .execute(pool)
    .await?;
    Ok(())
}

/// All sources with CONFIRMED status — the only ones the collection
/// scheduler fires fetchers for.
pub async fn list_confirmed(pool: &PgPool) -> StoreResult<Vec<Source>> {
    list_by_status(pool, SourceStatus::Confirmed).await
}

pub async fn list_by_status(pool: &PgPool, status: SourceStatus) -> StoreResult<Vec<Source>> {
    let rows = sqlx::query_as::<_, SourceRow>("SELECT * FROM sources WHERE status = $1 ORDER BY source_id")
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
    rows.into_iter()
        .map(|r| Source::try_from(r).map_err(crate::error::StoreError::Config))
        .collect()
}

pub async fn list_all(pool: &PgPool, fetch_method: Option<&str>, limit: i64) -> StoreResult<Vec<Source>> {
    let rows = match fetch_method {
        Some(fm) => {
            sqlx::query_as::<_, SourceRow>(
                "SELECT * FROM sources WHERE fetch_method = $1 ORDER BY source_id LIMIT $2",
            )
            .bind(fm)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, SourceRow>("SELECT * FROM sources ORDER BY source_id LIMIT $1")
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };
    rows.into_iter()
        .map(|r| Source::try_from(r).map_err(crate::error::StoreError::Config))
        .collect()
}

pub async fn get(pool: &PgPool, source_id: &str) -> StoreResult<Option<Source>> {
    let row = sqlx::query_as::<_, SourceRow>("SELECT * FROM sources WHERE source_id = $1")
        .bind(source_id)
        .fetch_optional(pool)
        .await?;
    row.map(|r| Source::try_from(r).map_err(crate::error::StoreError::Config))
        .transpose()
}

/// Per-status, per-fetch-method counts backing the `/api/sources/stats`
/// endpoint.
pub struct SourceStats {
    pub status: String,
    pub fetch_method: String,
    pub count: i64,
}

pub async fn stats(pool: &PgPool) -> StoreResult<Vec<SourceStats>> {
    let rows: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT status, fetch_method, COUNT(*) FROM sources GROUP BY status, fetch_method",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(status, fetch_method, count)| SourceStats {
            status,
            fetch_method,
            count,
        })
        .collect())
}
