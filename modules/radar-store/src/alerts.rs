use chrono::Utc;

use sqlx::PgPool;

use crate::error::StoreResult;
use crate::models::AlertRow;

/// Total alerts inserted since UTC midnight today — enforces the daily
/// cap (spec 4.13, default `max_alerts_per_day`).
pub async fn count_today(pool: &PgPool) -> StoreResult<i64> {
    let today_start = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts WHERE sent_at >= $1")
        .bind(today_start)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Whether an alert with this dedup key already exists today.
pub async fn already_sent(pool: &PgPool, dedup_key: &str) -> StoreResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM alerts WHERE dedup_key = $1)")
            .bind(dedup_key)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Records an alert. The dedup key is unique — a conflicting insert
/// (another worker winning the race) is a silent no-op and returns
/// `false`. Delivery to the sink happens before this call; this is the
/// immutable ledger entry, never mutated afterward.
pub async fn insert(
    pool: &PgPool,
    alert_type: &str,
    theme_id: Option<&str>,
    payload: &serde_json::Value,
    telegram_message_id: Option<&str>,
    dedup_key: &str,
) -> StoreResult<bool> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO alerts (alert_type, theme_id, payload, telegram_message_id, dedup_key)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (dedup_key) DO NOTHING
        "#,
    )
    .bind(alert_type)
    .bind(theme_id)
    .bind(payload)
    .bind(telegram_message_id)
    .bind(dedup_key)
    .execute(pool)
    .await?;
    Ok(inserted.rows_affected() > 0)
}

pub async fn list_recent(pool: &PgPool, limit: i64) -> StoreResult<Vec<AlertRow>> {
    let rows = sqlx::query_as::<_, AlertRow>("SELECT * FROM alerts ORDER BY sent_at DESC LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
