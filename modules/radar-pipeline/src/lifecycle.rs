use chrono::Utc;

use radar_common::{ThemeStatus, ThemeThesis};
use radar_llm::{CallOptions, LlmClient};
use radar_store::{themes, PgPool, StoreResult, Theme};

use crate::clusterer::Cluster;
use crate::scorer::{self, ThemeScores};

const ACTIVE_MIN_AGE_DAYS: i64 = 14;
const ACTIVE_MIN_TIGHTENING_COUNT: i32 = 6;
const ACTIVE_MIN_UNIQUE_ENTITIES: i32 = 4;
const ACTIVE_MIN_UNIQUE_SOURCES: i32 = 2;

const THESIS_SYSTEM: &str = "You write a short investment-relevant thesis for a supply-constraint \
theme from its recent events. Respond with a JSON object matching the required schema. \
Ground every claim in the events given — do not invent facts not supported by them. \
invalidation_triggers and relief_timeline must both be concrete and non-empty for an \
actionable thesis; leave them empty only if the events genuinely don't support a judgment.";

/// Runs one clustering cycle: scores every current cluster, upserts its
/// theme row, links its events, and advances status where the cluster
/// has crossed the next threshold. Returns the ids of themes that
/// changed status this cycle, for alert triage to consider.
pub async fn run_cycle(pool: &PgPool, llm: &LlmClient) -> StoreResult<Vec<String>> {
    let clusters = crate::clusterer::build_clusters(pool).await?;
    let mut promoted = Vec::new();

    for cluster in &clusters {
        let scores = scorer::score_cluster(pool, cluster).await?;
        themes::upsert(
            pool,
            &cluster.theme_id,
            &cluster.name,
            cluster.constraint_layer.as_str(),
            &to_store_scores(&scores),
        )
        .await?;

        for event in &cluster.events {
            themes::link_event(pool, &cluster.theme_id, event.id).await?;
        }

        let Some(theme) = themes::get(pool, &cluster.theme_id).await? else {
            continue;
        };

        if let Some(next) = next_status(&theme, &scores) {
            themes::advance_status(pool, &cluster.theme_id, next.as_str()).await?;
            promoted.push(cluster.theme_id.clone());

            if matches!(next, ThemeStatus::Active | ThemeStatus::Mature) {
                if let Err(e) = write_thesis(pool, llm, &cluster.theme_id).await {
                    tracing::warn!(theme_id = %cluster.theme_id, error = %e, "thesis generation failed");
                }
            }
        }
    }

    Ok(promoted)
}

fn to_store_scores(s: &ThemeScores) -> themes::ThemeScores {
    themes::ThemeScores {
        velocity: s.velocity,
        breadth: s.breadth,
        quality: s.quality,
        allocation: s.allocation,
        novelty: s.novelty,
        tightening_score: s.tightening_score,
        event_count: s.event_count,
        tightening_count: s.tightening_count,
        easing_count: s.easing_count,
        unique_entities: s.unique_entities,
        unique_sources: s.unique_sources,
    }
}

/// Evaluates the single next promotion threshold for a theme's current
/// status. Forward-only: a theme that no longer meets an earlier
/// threshold never regresses, it simply stops advancing.
fn next_status(theme: &Theme, scores: &ThemeScores) -> Option<ThemeStatus> {
    match theme.status {
        ThemeStatus::Candidate => {
            let age_days = (Utc::now() - theme.first_seen_at).num_days();
            if age_days >= ACTIVE_MIN_AGE_DAYS
                && scores.tightening_count >= ACTIVE_MIN_TIGHTENING_COUNT
                && scores.unique_entities >= ACTIVE_MIN_UNIQUE_ENTITIES
                && scores.unique_sources >= ACTIVE_MIN_UNIQUE_SOURCES
            {
                Some(ThemeStatus::Active)
            } else {
                None
            }
        }
        ThemeStatus::Active => {
            if scores.easing_count as f64 > 0.5 * scores.tightening_count as f64 {
                Some(ThemeStatus::Mature)
            } else {
                None
            }
        }
        ThemeStatus::Mature => {
            if scores.easing_count > scores.tightening_count {
                Some(ThemeStatus::Fading)
            } else {
                None
            }
        }
        ThemeStatus::Fading => None,
    }
}

/// Generates and stores a thesis from a theme's most recent 15 linked
/// events. A failure here must never roll back the status advance that
/// triggered it — a theme without a thesis is still correctly ACTIVE.
async fn write_thesis(pool: &PgPool, llm: &LlmClient, theme_id: &str) -> anyhow::Result<()> {
    let event_ids = themes::linked_event_ids(pool, theme_id, 15).await?;
    let mut summaries = Vec::new();
    for id in event_ids {
        if let Some(row) = radar_store::events::get(pool, id).await? {
            summaries.push(format!(
                "- {} ({}, {}): {}",
                row.event_type, row.direction, row.constraint_layer, row.evidence
            ));
        }
    }
    if summaries.is_empty() {
        return Ok(());
    }

    let prompt = format!("Recent events for this theme:\n{}", summaries.join("\n"));
    let opts = CallOptions {
        json_mode: true,
        ..Default::default()
    };
    let raw = llm.complete(Some(THESIS_SYSTEM), &prompt, opts).await?;
    let thesis: ThemeThesis = serde_json::from_str(&raw)?;
    themes::set_thesis(pool, theme_id, &thesis).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use radar_common::ConstraintLayer;
    use uuid::Uuid;

    fn theme(status: ThemeStatus, first_seen_at: chrono::DateTime<Utc>) -> Theme {
        Theme {
            theme_id: "t1".to_string(),
            name: "test".to_string(),
            constraint_layer: ConstraintLayer::ComputeSilicon,
            status,
            velocity_score: 0.0,
            breadth_score: 0.0,
            quality_score: 0.0,
            allocation_score: 0.0,
            novelty_score: 0.0,
            tightening_score: 0.0,
            event_count: 0,
            tightening_count: 0,
            easing_count: 0,
            unique_entities: 0,
            unique_sources: 0,
            thesis: None,
            first_seen_at,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn candidate_promotes_only_once_all_thresholds_met() {
        let t = theme(ThemeStatus::Candidate, Utc::now() - Duration::days(20));
        let mut scores = ThemeScores {
            tightening_count: 6,
            unique_entities: 4,
            unique_sources: 2,
            ..Default::default()
        };
        assert_eq!(next_status(&t, &scores), Some(ThemeStatus::Active));
        scores.unique_sources = 1;
        assert_eq!(next_status(&t, &scores), None);
    }

    #[test]
    fn mature_fades_when_easing_exceeds_tightening() {
        let t = theme(ThemeStatus::Mature, Utc::now());
        let scores = ThemeScores {
            tightening_count: 2,
            easing_count: 3,
            ..Default::default()
        };
        assert_eq!(next_status(&t, &scores), Some(ThemeStatus::Fading));
    }

    #[test]
    fn fading_never_advances_further() {
        let t = theme(ThemeStatus::Fading, Utc::now());
        assert_eq!(next_status(&t, &ThemeScores::default()), None);
        let _ = Uuid::new_v4();
    }
}
