use uuid::Uuid;

use sqlx::PgPool;

use radar_common::ThemeThesis;

use crate::error::StoreResult;
use crate::models::{Theme, ThemeRow};

pub struct ThemeScores {
    pub velocity: f64,
    pub breadth: f64,
    pub quality: f64,
    pub allocation: f64,
    pub novelty: f64,
    pub tightening_score: f64,
    pub event_count: i32,
    pub tightening_count: i32,
    pub easing_count: i32,
    pub unique_entities: i32,
    pub unique_sources: i32,
}

/// Creates the theme at CANDIDATE if it doesn't exist yet, then writes
/// the latest computed scores and counts regardless. Name and
/// constraint_layer are fixed at creation time (spec: themes mutate
/// score/status, not their identity).
pub async fn upsert(
    pool: &PgPool,
    theme_id: &str,
    name: &str,
    constraint_layer: &str,
    scores: &ThemeScores,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO themes
            (theme_id, name, constraint_layer, status,
             velocity_score, breadth_score, quality_score, allocation_score, novelty_score, tightening_score,
             event_count, tightening_count, easing_count, unique_entities, unique_sources)
        VALUES ($1, $2, $3, 'CANDIDATE', $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (theme_id) DO UPDATE SET
            velocity_score = EXCLUDED.velocity_score,
            breadth_score = EXCLUDED.breadth_score,
            quality_score = EXCLUDED.quality_score,
            allocation_score = EXCLUDED.allocation_score,
            novelty_score = EXCLUDED.novelty_score,
            tightening_score = EXCLUDED.tightening_score,
            event_count = EXCLUDED.event_count,
            tightening_count = EXCLUDED.tightening_count,
            easing_count = EXCLUDED.easing_count,
            unique_entities = EXCLUDED.unique_entities,
            unique_sources = EXCLUDED.unique_sources,
            updated_at = now()
        "#,
    )
    .bind(theme_id)
    .bind(name)
    .bind(constraint_layer)
    .bind(scores.velocity)
    .bind(scores.breadth)
    .bind(scores.quality)
    .bind(scores.allocation)
    .bind(scores.novelty)
    .bind(scores.tightening_score)
    .bind(scores.event_count)
    .bind(scores.tightening_count)
    .bind(scores.easing_count)
    .bind(scores.unique_entities)
    .bind(scores.unique_sources)
    .execute(pool)
    .await?;
    Ok(())
}

/// Links an event to a theme. (theme_id, event_id) is unique — a
/// duplicate link is a silent no-op.
pub async fn link_event(pool: &PgPool, theme_id: &str, event_id: Uuid) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO theme_events (theme_id, event_id) VALUES ($1, $2) ON CONFLICT (theme_id, event_id) DO NOTHING",
    )
    .bind(theme_id)
    .bind(event_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Advances a theme's status forward by exactly one step. Callers are
/// responsible for having already checked the promotion threshold for
/// the current status — this never reverts and never skips a step.
pub async fn advance_status(pool: &PgPool, theme_id: &str, to: &str) -> StoreResult<()> {
    sqlx::query("UPDATE themes SET status = $2, updated_at = now() WHERE theme_id = $1")
        .bind(theme_id)
        .bind(to)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_thesis(pool: &PgPool, theme_id: &str, thesis: &ThemeThesis) -> StoreResult<()> {
    let json = serde_json::to_value(thesis).unwrap_or_default();
    sqlx::query("UPDATE themes SET thesis = $2, updated_at = now() WHERE theme_id = $1")
        .bind(theme_id)
        .bind(json)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get(pool: &PgPool, theme_id: &str) -> StoreResult<Option<Theme>> {
    let row = sqlx::query_as::<_, ThemeRow>("SELECT * FROM themes WHERE theme_id = $1")
        .bind(theme_id)
        .fetch_optional(pool)
        .await?;
    row.map(|r| Theme::try_from(r).map_err(crate::error::StoreError::Config))
        .transpose()
}

pub async fn list_by_status(pool: &PgPool, status: Option<&str>, limit: i64) -> StoreResult<Vec<Theme>> {
    let rows = match status {
        Some(s) => {
            sqlx::query_as::<_, ThemeRow>(
                "SELECT * FROM themes WHERE status = $1 ORDER BY tightening_score DESC LIMIT $2",
            )
            .bind(s)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ThemeRow>("SELECT * FROM themes ORDER BY tightening_score DESC LIMIT $1")
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };
    rows.into_iter()
        .map(|r| Theme::try_from(r).map_err(crate::error::StoreError::Config))
        .collect()
}

/// Themes in CANDIDATE status, ordered by tightening_score descending —
/// the candidate pool for NEW_CANDIDATE alert triage.
pub async fn list_candidates(pool: &PgPool) -> StoreResult<Vec<Theme>> {
    list_by_status(pool, Some("CANDIDATE"), i64::MAX).await
}

/// Event ids linked to a theme, most recent first.
pub async fn linked_event_ids(pool: &PgPool, theme_id: &str, limit: i64) -> StoreResult<Vec<Uuid>> {
    let ids: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT e.id FROM events e
        JOIN theme_events te ON te.event_id = e.id
        WHERE te.theme_id = $1
        ORDER BY e.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(theme_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
