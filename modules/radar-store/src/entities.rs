use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{Entity, EntityRow};

pub async fn get(pool: &PgPool, entity_id: &str) -> StoreResult<Option<Entity>> {
    let row = sqlx::query_as::<_, EntityRow>("SELECT * FROM entities WHERE entity_id = $1")
        .bind(entity_id)
        .fetch_optional(pool)
        .await?;
    row.map(|r| Entity::try_from(r).map_err(crate::error::StoreError::Config))
        .transpose()
}

/// Case-insensitive match on `canonical_name`, used by entity discovery
/// when no id override and no existing `entity_id` match are found.
pub async fn find_by_canonical_name_ci(pool: &PgPool, name: &str) -> StoreResult<Option<Entity>> {
    let row = sqlx::query_as::<_, EntityRow>(
        "SELECT * FROM entities WHERE lower(canonical_name) = lower($1) LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    row.map(|r| Entity::try_from(r).map_err(crate::error::StoreError::Config))
        .transpose()
}

pub struct NewEntity {
    pub entity_id: String,
    pub canonical_name: String,
    pub entity_type: String,
    pub aliases: HashMap<String, Vec<String>>,
    pub discovered_from_item: Option<Uuid>,
}

/// Inserts a newly discovered entity at mention_count = 1, or — if the
/// id already exists (a race with another concurrent discovery) —
/// bumps its mention count instead. Mirrors the upsert the original
/// discovery pass relies on for idempotency.
pub async fn insert_discovered(pool: &PgPool, e: NewEntity) -> StoreResult<()> {
    let aliases_json = serde_json::to_value(&e.aliases).unwrap_or_default();
    sqlx::query(
        r#"
        INSERT INTO entities
            (entity_id, canonical_name, entity_type, aliases, status, mention_count, discovered_from_item)
        VALUES ($1, $2, $3, $4, 'DISCOVERED', 1, $5)
        ON CONFLICT (entity_id) DO UPDATE SET mention_count = entities.mention_count + 1, updated_at = now()
        "#,
    )
    .bind(&e.entity_id)
    .bind(&e.canonical_name)
    .bind(&e.entity_type)
    .bind(&aliases_json)
    .bind(e.discovered_from_item)
    .execute(pool)
    .await?;
    Ok(())
}

/// Atomically increments mention_count for an existing entity by one —
/// mention_count must be monotonically non-decreasing.
pub async fn bump_mention_count(pool: &PgPool, entity_id: &str) -> StoreResult<()> {
    sqlx::query("UPDATE entities SET mention_count = mention_count + 1, updated_at = now() WHERE entity_id = $1")
        .bind(entity_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_mention(
    pool: &PgPool,
    entity_id: &str,
    item_id: Uuid,
    context_snippet: &str,
    layer_hint: Option<&str>,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO entity_mentions (entity_id, item_id, context_snippet, layer_hint) VALUES ($1, $2, $3, $4)",
    )
    .bind(entity_id)
    .bind(item_id)
    .bind(context_snippet)
    .bind(layer_hint)
    .execute(pool)
    .await?;
    Ok(())
}

/// Earliest mention timestamp for an entity — backs the novelty score
/// component (spec 4.10: "first-ever mention within last 14 days").
pub async fn first_mention_at(pool: &PgPool, entity_id: &str) -> StoreResult<Option<DateTime<Utc>>> {
    let min: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MIN(created_at) FROM entity_mentions WHERE entity_id = $1")
            .bind(entity_id)
            .fetch_one(pool)
            .await?;
    Ok(min)
}

/// All entities and their full alias set, used to rebuild the in-memory
/// alias index after any discovery or promotion change.
pub async fn list_all(pool: &PgPool) -> StoreResult<Vec<Entity>> {
    let rows = sqlx::query_as::<_, EntityRow>("SELECT * FROM entities").fetch_all(pool).await?;
    rows.into_iter()
        .map(|r| Entity::try_from(r).map_err(crate::error::StoreError::Config))
        .collect()
}

/// DISCOVERED entities with mention_count >= 3 across >= 2 distinct
/// sources, promoted to PROVISIONAL.
pub async fn promote_discovered_to_provisional(pool: &PgPool) -> StoreResult<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        r#"
        UPDATE entities SET status = 'PROVISIONAL', updated_at = now()
        WHERE entity_id IN (
            SELECT e.entity_id
            FROM entities e
            JOIN entity_mentions m ON m.entity_id = e.entity_id
            JOIN items i ON i.id = m.item_id
            WHERE e.status = 'DISCOVERED' AND e.mention_count >= 3
            GROUP BY e.entity_id
            HAVING COUNT(DISTINCT i.source_id) >= 2
        )
        RETURNING entity_id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// PROVISIONAL entities with mention_count >= 6 across >= 3 distinct
/// sources and at least one TIGHTENING event referencing them, promoted
/// to CONFIRMED.
pub async fn promote_provisional_to_confirmed(pool: &PgPool) -> StoreResult<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        r#"
        UPDATE entities SET status = 'CONFIRMED', updated_at = now()
        WHERE entity_id IN (
            SELECT e.entity_id
            FROM entities e
            JOIN entity_mentions m ON m.entity_id = e.entity_id
            JOIN items i ON i.id = m.item_id
            WHERE e.status = 'PROVISIONAL' AND e.mention_count >= 6
            GROUP BY e.entity_id
            HAVING COUNT(DISTINCT i.source_id) >= 3
                AND EXISTS (
                    SELECT 1 FROM events ev
                    WHERE ev.direction = 'TIGHTENING'
                      AND ev.entities @> jsonb_build_array(jsonb_build_object('entity_id', e.entity_id))::jsonb
                )
        )
        RETURNING entity_id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
