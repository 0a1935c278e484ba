use chrono::Utc;

use radar_common::Config;
use radar_store::{alerts, events, themes, PgPool, StoreResult};

use crate::telegram::TelegramSink;

const INFLECTION_WINDOW_MINUTES: i64 = 30;

/// Runs the three theme-triggered alert checks plus — once per UTC day
/// at a fixed hour — the digest. Every check respects the shared daily
/// cap: once `max_alerts_per_day` alerts have been sent today, no
/// further alerts go out, checked before every single send rather than
/// once up front (three checks with dozens of candidates apiece would
/// otherwise blow well past the cap in one `run_triage` call).
pub async fn run_triage(pool: &PgPool, sink: &TelegramSink, config: &Config) -> StoreResult<()> {
    let cap = config.max_alerts_per_day as i64;
    if alerts::count_today(pool).await? >= cap {
        tracing::info!("daily alert cap reached, skipping triage");
        return Ok(());
    }

    check_new_candidates(pool, sink, cap).await?;
    check_inflection(pool, sink, cap).await?;
    check_actionable_briefing(pool, sink, cap).await?;

    Ok(())
}

async fn cap_reached(pool: &PgPool, cap: i64) -> StoreResult<bool> {
    Ok(alerts::count_today(pool).await? >= cap)
}

/// NEW_CANDIDATE: every CANDIDATE theme with at least three linked
/// events, most tightening first — no separate score bar, event_count
/// is the only gate.
async fn check_new_candidates(pool: &PgPool, sink: &TelegramSink, cap: i64) -> StoreResult<()> {
    const MIN_EVENT_COUNT: i32 = 3;
    for theme in themes::list_candidates(pool).await? {
        if cap_reached(pool, cap).await? {
            break;
        }
        if theme.event_count < MIN_EVENT_COUNT {
            continue;
        }
        let dedup_key = format!("NEW_CANDIDATE:{}:{}", theme.theme_id, today_key());
        if alerts::already_sent(pool, &dedup_key).await? {
            continue;
        }
        let text = format!(
            "🟡 *New candidate theme*: {}\nScore: {:.2}",
            theme.name, theme.tightening_score
        );
        let message_id = sink.send(&text).await.unwrap_or(None);
        alerts::insert(
            pool,
            "NEW_CANDIDATE",
            Some(&theme.theme_id),
            &serde_json::json!({"name": theme.name, "score": theme.tightening_score}),
            message_id.as_deref(),
            &dedup_key,
        )
        .await?;
    }
    Ok(())
}

/// INFLECTION: a burst of tier-1, TIGHTENING events of an inflection
/// event type in the last thirty minutes — a signal worth surfacing
/// immediately rather than waiting for the next clustering cycle.
async fn check_inflection(pool: &PgPool, sink: &TelegramSink, cap: i64) -> StoreResult<()> {
    if cap_reached(pool, cap).await? {
        return Ok(());
    }

    let recent = events::recent_tier1_tightening(pool, INFLECTION_WINDOW_MINUTES).await?;
    let inflection_worthy: Vec<_> = recent
        .into_iter()
        .filter(|e| {
            e.event_type
                .parse::<radar_common::EventType>()
                .map(|t| t.is_inflection_candidate())
                .unwrap_or(false)
        })
        .collect();

    if inflection_worthy.is_empty() {
        return Ok(());
    }

    let dedup_key = format!("INFLECTION:{}", today_key());
    if alerts::already_sent(pool, &dedup_key).await? {
        return Ok(());
    }

    let text = format!(
        "🔴 *Inflection alert*: {} tier-1 tightening events in the last 30 minutes",
        inflection_worthy.len()
    );
    let message_id = sink.send(&text).await.unwrap_or(None);
    alerts::insert(
        pool,
        "INFLECTION",
        None,
        &serde_json::json!({"count": inflection_worthy.len()}),
        message_id.as_deref(),
        &dedup_key,
    )
    .await?;
    Ok(())
}

/// ACTIONABLE_BRIEFING: an ACTIVE or MATURE theme with tightening_score
/// >= 0.70, unique_sources >= 3, and a thesis whose invalidation
/// triggers and relief timeline are both populated — the bar that
/// separates a briefing worth interrupting someone for from a merely
/// descriptive one.
async fn check_actionable_briefing(pool: &PgPool, sink: &TelegramSink, cap: i64) -> StoreResult<()> {
    const MIN_SCORE: f64 = 0.70;
    const MIN_UNIQUE_SOURCES: i32 = 3;

    for status in ["ACTIVE", "MATURE"] {
        for theme in themes::list_by_status(pool, Some(status), 50).await? {
            if cap_reached(pool, cap).await? {
                return Ok(());
            }
            if theme.tightening_score < MIN_SCORE || theme.unique_sources < MIN_UNIQUE_SOURCES {
                continue;
            }
            let Some(thesis) = &theme.thesis else { continue };
            if !thesis.is_actionable() {
                continue;
            }
            let dedup_key = format!("ACTIONABLE_BRIEFING:{}:{}", theme.theme_id, today_key());
            if alerts::already_sent(pool, &dedup_key).await? {
                continue;
            }
            let text = format!(
                "🟢 *Actionable briefing*: {}\n{}\n_Why now:_ {}",
                theme.name, thesis.one_liner, thesis.why_now
            );
            let message_id = sink.send(&text).await.unwrap_or(None);
            alerts::insert(
                pool,
                "ACTIONABLE_BRIEFING",
                Some(&theme.theme_id),
                &serde_json::json!({"one_liner": thesis.one_liner}),
                message_id.as_deref(),
                &dedup_key,
            )
            .await?;
        }
    }
    Ok(())
}

/// DAILY_DIGEST: a single end-of-day summary across every ACTIVE/MATURE
/// theme, separate from the per-alert cap since it fires at most once
/// per day by construction.
pub async fn run_daily_digest(pool: &PgPool, sink: &TelegramSink) -> StoreResult<()> {
    let dedup_key = format!("DAILY_DIGEST:{}", today_key());
    if alerts::already_sent(pool, &dedup_key).await? {
        return Ok(());
    }

    let mut active = themes::list_by_status(pool, Some("ACTIVE"), 20).await?;
    active.extend(themes::list_by_status(pool, Some("MATURE"), 20).await?);

    let mut lines = vec!["📋 *Daily digest*".to_string()];
    for theme in &active {
        lines.push(format!("- {} ({:.2})", theme.name, theme.tightening_score));
    }
    if active.is_empty() {
        lines.push("No active themes today.".to_string());
    }

    let message_id = sink.send(&lines.join("\n")).await.unwrap_or(None);
    alerts::insert(
        pool,
        "DAILY_DIGEST",
        None,
        &serde_json::json!({"theme_count": active.len()}),
        message_id.as_deref(),
        &dedup_key,
    )
    .await?;
    Ok(())
}

fn today_key() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_key_is_date_only() {
        let key = today_key();
        assert_eq!(key.len(), 10);
        assert_eq!(key.matches('-').count(), 2);
    }
}
