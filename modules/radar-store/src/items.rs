use chrono::{DateTime, Utc};
use uuid::Uuid;

use sqlx::PgPool;

use radar_common::PipelineStatus;

use crate::error::StoreResult;
use crate::models::{Item, ItemRow};

pub struct NewItem {
    pub source_id: String,
    pub url: String,
    pub url_hash: String,
    pub content_hash: Option<String>,
    pub title: Option<String>,
    pub raw_text: Option<String>,
    pub language: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Inserts a freshly fetched item as COLLECTED. Returns `None` (instead
/// of erroring) when `url_hash` already exists — the common path for a
/// fetcher re-visiting a known URL — or when `content_hash` matches an
/// item already seen under a different URL (a cross-source republish of
/// the same story). Both are silent dedup, never a pipeline error.
pub async fn insert_collected(pool: &PgPool, item: NewItem) -> StoreResult<Option<Uuid>> {
    if let Some(hash) = &item.content_hash {
        let dup: Option<i32> = sqlx::query_scalar("SELECT 1 FROM items WHERE content_hash = $1")
            .bind(hash)
            .fetch_optional(pool)
            .await?;
        if dup.is_some() {
            return Ok(None);
        }
    }

    let result = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO items
            (source_id, url, url_hash, content_hash, title, raw_text, language,
             published_at, pipeline_status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'COLLECTED')
        ON CONFLICT (url_hash) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&item.source_id)
    .bind(&item.url)
    .bind(&item.url_hash)
    .bind(&item.content_hash)
    .bind(&item.title)
    .bind(&item.raw_text)
    .bind(&item.language)
    .bind(item.published_at)
    .fetch_optional(pool)
    .await;

    match result {
        Ok(id) => Ok(id),
        // A concurrent insert can win the content_hash race between our
        // pre-check and this statement; the partial unique index then
        // rejects us exactly like a url_hash conflict would, and we
        // treat it the same way: already seen, not an error.
        Err(sqlx::Error::Database(e)) if e.constraint() == Some("items_content_hash_unique") => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Atomically claims up to `batch_size` of the oldest items in `from`
/// status and advances them to `to`, using `FOR UPDATE SKIP LOCKED` so
/// concurrent sweep loops (including on other replicas) never claim the
/// same row twice.
pub async fn claim_batch(
    pool: &PgPool,
    from: PipelineStatus,
    to: PipelineStatus,
    batch_size: i64,
) -> StoreResult<Vec<Item>> {
    let rows = sqlx::query_as::<_, ItemRow>(
        r#"
        UPDATE items SET pipeline_status = $2, updated_at = now()
        WHERE id IN (
            SELECT id FROM items
            WHERE pipeline_status = $1
            ORDER BY fetched_at
            LIMIT $3
            FOR UPDATE SKIP LOCKED
        )
        RETURNING *
        "#,
    )
    .bind(from.as_str())
    .bind(to.as_str())
    .bind(batch_size)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| Item::try_from(r).map_err(crate::error::StoreError::Config))
        .collect()
}

/// Marks an item as NORMALIZED/LINKED/etc. with updated derived fields,
/// without reclaiming it from a different starting status — used after a
/// worker finishes processing a claimed item.
pub async fn set_normalized(
    pool: &PgPool,
    id: Uuid,
    text_en: Option<&str>,
    translation_confidence: Option<f64>,
    content_hash: Option<&str>,
) -> StoreResult<()> {
    sqlx::query(
        "UPDATE items SET text_en = $2, translation_confidence = $3, content_hash = COALESCE($4, content_hash), updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(text_en)
    .bind(translation_confidence)
    .bind(content_hash)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_status(pool: &PgPool, id: Uuid, status: PipelineStatus) -> StoreResult<()> {
    sqlx::query("UPDATE items SET pipeline_status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Marks an item ERROR with a short reason tag. Never propagates — a
/// per-item failure must not abort the rest of the batch.
pub async fn set_error(pool: &PgPool, id: Uuid, reason_tag: &str) -> StoreResult<()> {
    sqlx::query(
        "UPDATE items SET pipeline_status = 'ERROR', pipeline_error = $2, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(reason_tag)
    .execute(pool)
    .await?;
    Ok(())
}

/// Pages through items in a given status without claiming them —
/// for offline maintenance tools (backfills) that read a fixed
/// snapshot rather than competing with the live pipeline for rows.
pub async fn list_by_status_paginated(
    pool: &PgPool,
    status: PipelineStatus,
    limit: i64,
    offset: i64,
) -> StoreResult<Vec<Item>> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT * FROM items WHERE pipeline_status = $1 ORDER BY fetched_at LIMIT $2 OFFSET $3",
    )
    .bind(status.as_str())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| Item::try_from(r).map_err(crate::error::StoreError::Config))
        .collect()
}

pub async fn get(pool: &PgPool, id: Uuid) -> StoreResult<Option<Item>> {
    let row = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(|r| Item::try_from(r).map_err(crate::error::StoreError::Config))
        .transpose()
}
