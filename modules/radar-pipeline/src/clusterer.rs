use std::collections::HashMap;

use radar_common::{slugify, ConstraintLayer};
use radar_store::events::ClusterableEvent;
use radar_store::{events, PgPool, StoreResult};

/// A group of events sharing a constraint layer and a dominant object,
/// the unit the scorer and lifecycle stage operate on.
pub struct Cluster {
    pub theme_id: String,
    pub name: String,
    pub constraint_layer: ConstraintLayer,
    pub events: Vec<ClusterableEvent>,
}

const CLUSTER_WINDOW_DAYS: i64 = 30;
const MIN_CLUSTER_SIZE: usize = 2;

/// Groups the last 30 days of events by `(constraint_layer, object)`,
/// dropping clusters with fewer than two events — a single event is a
/// data point, not yet a theme. Events with no object fall into a
/// layer-wide `_general` bucket rather than being dropped. An event
/// naming N objects contributes to N candidate clusters, not just one.
pub async fn build_clusters(pool: &PgPool) -> StoreResult<Vec<Cluster>> {
    let recent = events::recent_with_item(pool, CLUSTER_WINDOW_DAYS).await?;

    let mut buckets: HashMap<(String, String), Vec<ClusterableEvent>> = HashMap::new();
    for event in recent {
        let layer = event.constraint_layer.clone();
        let objects = object_names(&event);
        if objects.is_empty() {
            buckets.entry((layer, "_general".to_string())).or_default().push(event);
        } else {
            for object in objects {
                buckets.entry((layer.clone(), object)).or_default().push(event.clone());
            }
        }
    }

    let mut clusters = Vec::new();
    for ((layer, object), mut group) in buckets {
        if group.len() < MIN_CLUSTER_SIZE {
            continue;
        }
        group.sort_by_key(|e| e.created_at);

        let Ok(constraint_layer) = layer.parse::<ConstraintLayer>() else {
            continue;
        };
        let cluster_key = format!("{layer}:{object}");
        let theme_id = slugify(&cluster_key, 60);
        let name = if object == "_general" {
            format!("{} constraints", constraint_layer.as_str())
        } else {
            format!("{} — {}", constraint_layer.as_str(), object)
        };

        clusters.push(Cluster {
            theme_id,
            name,
            constraint_layer,
            events: group,
        });
    }

    Ok(clusters)
}

/// Every object name an event carries, lowercased. An event naming
/// several objects is a candidate member of each one's cluster.
fn object_names(event: &ClusterableEvent) -> Vec<String> {
    let objects: Vec<radar_common::ObjectRef> = serde_json::from_value(event.objects.clone()).unwrap_or_default();
    objects.into_iter().map(|o| o.name.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_key_slug_is_deterministic() {
        let key = "MEMORY:taiwan semiconductor";
        assert_eq!(slugify(key, 60), "memory_taiwan_semiconductor");
    }
}
