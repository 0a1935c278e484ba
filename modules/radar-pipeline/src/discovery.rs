use std::collections::HashMap;

use uuid::Uuid;

use radar_common::slugify;
use radar_store::{entities, PgPool, StoreResult};

use crate::linker::normalize_entity_type;

/// A candidate entity surfaced by extraction or a seed file, before it
/// is reconciled against what already exists.
pub struct DiscoveryCandidate {
    pub id_override: Option<String>,
    pub canonical_name: String,
    pub entity_type_raw: String,
    pub aliases: HashMap<String, Vec<String>>,
    pub discovered_from_item: Option<Uuid>,
}

/// Finds-or-creates an entity for a candidate and returns its entity_id.
///
/// Resolution order mirrors the original discovery pass: an explicit
/// `id_override` wins outright (bumping the mention count if it already
/// exists); otherwise a case-insensitive canonical-name match reuses the
/// existing entity; only when neither matches is a new entity minted
/// with a slug-derived id. This order keeps the same real-world company
/// from spawning duplicate entities across extraction runs.
pub async fn discover_entity(pool: &PgPool, candidate: DiscoveryCandidate) -> StoreResult<String> {
    if let Some(id) = &candidate.id_override {
        if entities::get(pool, id).await?.is_some() {
            entities::bump_mention_count(pool, id).await?;
            return Ok(id.clone());
        }
    }

    if let Some(existing) = entities::find_by_canonical_name_ci(pool, &candidate.canonical_name).await? {
        entities::bump_mention_count(pool, &existing.entity_id).await?;
        return Ok(existing.entity_id);
    }

    let entity_type = normalize_entity_type(&candidate.entity_type_raw);
    let entity_id = candidate
        .id_override
        .clone()
        .unwrap_or_else(|| format!("E:{}:{}", entity_type.as_str(), slugify(&candidate.canonical_name, 50)));

    entities::insert_discovered(
        pool,
        entities::NewEntity {
            entity_id: entity_id.clone(),
            canonical_name: candidate.canonical_name,
            entity_type: entity_type.as_str().to_string(),
            aliases: candidate.aliases,
            discovered_from_item: candidate.discovered_from_item,
        },
    )
    .await?;

    Ok(entity_id)
}

/// Runs both promotion passes (DISCOVERED -> PROVISIONAL -> CONFIRMED)
/// and returns every entity id that changed status, so callers can
/// decide whether to rebuild the alias index.
pub async fn promote_entities(pool: &PgPool) -> StoreResult<Vec<String>> {
    let mut promoted = entities::promote_discovered_to_provisional(pool).await?;
    promoted.extend(entities::promote_provisional_to_confirmed(pool).await?);
    Ok(promoted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_format_uses_type_and_slug() {
        let entity_type = normalize_entity_type("company");
        let id = format!("E:{}:{}", entity_type.as_str(), slugify("Taiwan Semiconductor Mfg.", 50));
        assert_eq!(id, "E:COMPANY:taiwan_semiconductor_mfg");
    }
}
