use std::path::Path;

use radar_store::entities::NewEntity;
use radar_store::sources::NewSource;
use radar_store::{entities, sources, PgPool};

use crate::config::{load_seed_entities, load_seed_sources, SeedEntity, SeedSource};

/// Loads the seed sources YAML and upserts every row, returning the
/// number of sources written. Re-running against an unchanged file is a
/// no-op thanks to `upsert_seed`'s `ON CONFLICT` semantics.
pub async fn seed_sources(pool: &PgPool, path: &Path) -> anyhow::Result<usize> {
    let rows = load_seed_sources(path)?;
    let count = rows.len();
    for row in rows {
        sources::upsert_seed(pool, to_new_source(row)).await?;
    }
    Ok(count)
}

/// Loads the seed entities YAML and inserts each as a DISCOVERED entity
/// if absent, or bumps its mention count if it already exists — seed
/// entities enter the same lifecycle as LLM-discovered ones rather than
/// a privileged "pre-confirmed" path.
pub async fn seed_entities(pool: &PgPool, path: &Path) -> anyhow::Result<usize> {
    let rows = load_seed_entities(path)?;
    let count = rows.len();
    for row in rows {
        let entity_id = row.entity_id.clone();
        if entities::get(pool, &entity_id).await?.is_some() {
            entities::bump_mention_count(pool, &entity_id).await?;
            continue;
        }
        entities::insert_discovered(pool, to_new_entity(row)).await?;
    }
    Ok(count)
}

fn to_new_source(row: SeedSource) -> NewSource {
    NewSource {
        source_id: row.source_id,
        display_name: row.display_name,
        url: row.url,
        feed_url: row.feed_url,
        fetch_method: row.fetch_method,
        language: row.language,
        tier: row.tier,
        reliability: row.reliability,
        earliness: row.earliness,
        schedule_minutes: row.schedule_minutes,
        layers: row.layers,
        search_queries: row.search_queries,
        status: row.status,
    }
}

fn to_new_entity(row: SeedEntity) -> NewEntity {
    NewEntity {
        entity_id: row.entity_id,
        canonical_name: row.canonical_name,
        entity_type: row.entity_type.to_uppercase(),
        aliases: row.aliases,
        discovered_from_item: None,
    }
}
