use std::collections::HashSet;

use chrono::Utc;

use radar_common::{Direction, EntityRef, EventType};
use radar_store::events::ClusterableEvent;
use radar_store::{entities, PgPool, StoreResult};

use crate::clusterer::Cluster;

#[derive(Debug, Clone, Default)]
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

const VELOCITY_WINDOW_DAYS: i64 = 7;
const NOVELTY_WINDOW_DAYS: i64 = 14;

/// Computes the five-component tightening score for a cluster. Every
/// component is clamped to [0, 1] before weighting so no single signal
/// can dominate the composite past its intended share.
pub async fn score_cluster(pool: &PgPool, cluster: &Cluster) -> StoreResult<ThemeScores> {
    let now = Utc::now();

    let tightening_count = cluster
        .events
        .iter()
        .filter(|e| e.direction == Direction::Tightening.as_str())
        .count() as i32;
    let easing_count = cluster
        .events
        .iter()
        .filter(|e| e.direction == Direction::Easing.as_str())
        .count() as i32;

    let recent_tightening = cluster
        .events
        .iter()
        .filter(|e| {
            e.direction == Direction::Tightening.as_str()
                && (now - e.created_at).num_days() <= VELOCITY_WINDOW_DAYS
        })
        .count();
    let velocity = (recent_tightening as f64 / 10.0).min(1.0);

    let mut entity_ids = HashSet::new();
    let mut source_ids = HashSet::new();
    let mut allocation_like = 0;
    for event in &cluster.events {
        source_ids.insert(event.item_source_id.clone());
        if let Ok(refs) = serde_json::from_value::<Vec<EntityRef>>(event.entities.clone()) {
            for r in refs {
                entity_ids.insert(r.entity_id);
            }
        }
        if event
            .event_type
            .parse::<EventType>()
            .map(|t| t.counts_toward_allocation())
            .unwrap_or(false)
        {
            allocation_like += 1;
        }
    }

    let breadth = ((entity_ids.len() as f64 / 10.0) + (source_ids.len() as f64 / 5.0)) / 2.0;
    let breadth = breadth.min(1.0);

    let quality = mean_tier_weight(&cluster.events);
    let allocation = (allocation_like as f64 / 5.0).min(1.0);

    let novel = novel_entity_count(pool, &entity_ids, now, NOVELTY_WINDOW_DAYS).await?;
    let novelty = (novel as f64 / 3.0).min(1.0);

    let tightening_score = round3(0.35 * velocity + 0.20 * breadth + 0.20 * quality + 0.15 * allocation + 0.10 * novelty);

    Ok(ThemeScores {
        velocity: round3(velocity),
        breadth: round3(breadth),
        quality: round3(quality),
        allocation: round3(allocation),
        novelty: round3(novelty),
        tightening_score,
        event_count: cluster.events.len() as i32,
        tightening_count,
        easing_count,
        unique_entities: entity_ids.len() as i32,
        unique_sources: source_ids.len() as i32,
    })
}

/// Mean source-tier weight across a cluster's events, clamped to
/// [0, 1]. Tier 1 (wire services, regulators) weighs full, tier 2
/// (trade press) weighs 0.6, tier 3 (blogs, forums) 0.3 — matching the
/// reliability spread sources are seeded with.
fn mean_tier_weight(events: &[ClusterableEvent]) -> f64 {
    if events.is_empty() {
        return 0.0;
    }
    let sum: f64 = events
        .iter()
        .map(|e| match e.item_source_tier {
            1 => 1.0,
            2 => 0.6,
            3 => 0.3,
            _ => 0.3,
        })
        .sum();
    (sum / events.len() as f64).clamp(0.0, 1.0)
}

/// Counts entities in the cluster whose first-ever mention fell within
/// the last `window_days` — the novelty signal: a theme built on
/// entities nobody had mentioned before is more newsworthy than one
/// rehashing familiar names.
async fn novel_entity_count(
    pool: &PgPool,
    entity_ids: &HashSet<String>,
    now: chrono::DateTime<Utc>,
    window_days: i64,
) -> StoreResult<usize> {
    let mut count = 0;
    for entity_id in entity_ids {
        if let Some(first_seen) = entities::first_mention_at(pool, entity_id).await? {
            if (now - first_seen).num_days() <= window_days {
                count += 1;
            }
        }
    }
    Ok(count)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_weight_matches_reliability_spread() {
        let make = |tier: i16| ClusterableEvent {
            id: uuid::Uuid::new_v4(),
            item_id: uuid::Uuid::new_v4(),
            event_type: "PRICE_INCREASE".to_string(),
            constraint_layer: "PRICING".to_string(),
            secondary_layer: None,
            direction: "TIGHTENING".to_string(),
            entities: serde_json::json!([]),
            objects: serde_json::json!([]),
            magnitude: serde_json::json!({}),
            timing: serde_json::json!({}),
            evidence: serde_json::json!({}),
            tags: vec![],
            confidence: 0.5,
            created_at: Utc::now(),
            item_source_id: "src".to_string(),
            item_source_tier: tier,
        };
        assert_eq!(mean_tier_weight(&[make(1)]), 1.0);
        assert_eq!(mean_tier_weight(&[make(2)]), 0.6);
        assert_eq!(mean_tier_weight(&[make(3)]), 0.3);
    }

    #[test]
    fn composite_score_is_rounded_to_three_decimals() {
        assert_eq!(round3(0.123456), 0.123);
    }
}
