use chrono::{DateTime, Utc};
use uuid::Uuid;

use sqlx::PgPool;

use radar_common::ConstraintEvent;

use crate::error::StoreResult;
use crate::models::EventRow;

/// Persists a single validated event. Returns the new row id.
pub async fn insert(pool: &PgPool, item_id: Uuid, event: &ConstraintEvent) -> StoreResult<Uuid> {
    let entities = serde_json::to_value(&event.entities).unwrap_or_default();
    let objects = serde_json::to_value(&event.objects).unwrap_or_default();
    let magnitude = serde_json::to_value(&event.magnitude).unwrap_or_default();
    let timing = serde_json::to_value(&event.timing).unwrap_or_default();
    let evidence = serde_json::to_value(&event.evidence).unwrap_or_default();

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO events
            (item_id, event_type, constraint_layer, secondary_layer, direction,
             entities, objects, magnitude, timing, evidence, tags, confidence)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(item_id)
    .bind(event.event_type.as_str())
    .bind(event.constraint_layer.as_str())
    .bind(event.secondary_layer.map(|l| l.as_str()))
    .bind(event.direction.as_str())
    .bind(entities)
    .bind(objects)
    .bind(magnitude)
    .bind(timing)
    .bind(evidence)
    .bind(&event.tags)
    .bind(event.confidence)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// An event plus the source tier and source_id of the item it came
/// from — what the clusterer and scorer need without a second round
/// trip per event. Columns are listed explicitly (rather than `e.*`)
/// so the field order matches this struct exactly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClusterableEvent {
    pub id: Uuid,
    pub item_id: Uuid,
    pub event_type: String,
    pub constraint_layer: String,
    pub secondary_layer: Option<String>,
    pub direction: String,
    pub entities: serde_json::Value,
    pub objects: serde_json::Value,
    pub magnitude: serde_json::Value,
    pub timing: serde_json::Value,
    pub evidence: serde_json::Value,
    pub tags: Vec<String>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub item_source_id: String,
    pub item_source_tier: i16,
}

/// Events created in the last `days` days joined with their source's
/// tier — the clusterer's event universe for each cycle.
pub async fn recent_with_item(pool: &PgPool, days: i64) -> StoreResult<Vec<ClusterableEvent>> {
    let rows = sqlx::query_as::<_, ClusterableEvent>(
        r#"
        SELECT e.id, e.item_id, e.event_type, e.constraint_layer, e.secondary_layer,
               e.direction, e.entities, e.objects, e.magnitude, e.timing, e.evidence,
               e.tags, e.confidence, e.created_at,
               i.source_id AS item_source_id, s.tier AS item_source_tier
        FROM events e
        JOIN items i ON i.id = e.item_id
        JOIN sources s ON s.source_id = i.source_id
        WHERE e.created_at > now() - ($1 || ' days')::interval
        ORDER BY e.created_at
        "#,
    )
    .bind(days.to_string())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Count of TIGHTENING events of the given event types created in the
/// last 30 minutes, tier-1 sourced — the inflection alert trigger set.
pub async fn recent_tier1_tightening(pool: &PgPool, minutes: i64) -> StoreResult<Vec<EventRow>> {
    let rows = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT e.* FROM events e
        JOIN items i ON i.id = e.item_id
        JOIN sources s ON s.source_id = i.source_id
        WHERE e.created_at > now() - ($1 || ' minutes')::interval
          AND e.direction = 'TIGHTENING'
          AND s.tier = 1
        ORDER BY e.created_at
        "#,
    )
    .bind(minutes.to_string())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: Uuid) -> StoreResult<Option<EventRow>> {
    let row = sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub struct EventFilter {
    pub layer: Option<String>,
    pub direction: Option<String>,
    pub event_type: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// One (layer, week) cell of the tightening heatmap.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct HeatmapCell {
    pub constraint_layer: String,
    pub week_start: DateTime<Utc>,
    pub event_count: i64,
    pub tightening: i64,
    pub easing: i64,
}

/// Tightening/easing event counts per layer per week over the trailing
/// `weeks` weeks — the `/api/heatmap` data source. The per-cell net
/// score (tightening minus easing, normalized by event_count) is left
/// for the caller to derive so the stored shape stays a plain tally.
pub async fn heatmap(pool: &PgPool, weeks: i64) -> StoreResult<Vec<HeatmapCell>> {
    let rows = sqlx::query_as::<_, HeatmapCell>(
        r#"
        SELECT
            constraint_layer,
            date_trunc('week', created_at) AS week_start,
            COUNT(*) AS event_count,
            SUM(CASE WHEN direction = 'TIGHTENING' THEN 1 ELSE 0 END) AS tightening,
            SUM(CASE WHEN direction = 'EASING' THEN 1 ELSE 0 END) AS easing
        FROM events
        WHERE created_at > now() - ($1 || ' weeks')::interval
        GROUP BY constraint_layer, week_start
        ORDER BY constraint_layer, week_start
        "#,
    )
    .bind(weeks.to_string())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list(pool: &PgPool, filter: EventFilter) -> StoreResult<Vec<EventRow>> {
    let rows = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT * FROM events
        WHERE ($1::text IS NULL OR constraint_layer = $1)
          AND ($2::text IS NULL OR direction = $2)
          AND ($3::text IS NULL OR event_type = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(filter.layer)
    .bind(filter.direction)
    .bind(filter.event_type)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
