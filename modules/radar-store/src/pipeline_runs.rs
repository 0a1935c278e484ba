use chrono::Utc;
use uuid::Uuid;

use sqlx::PgPool;

use crate::error::StoreResult;

/// Records the start of a stage run. The returned id is passed to
/// [`finish`] once the stage completes.
pub async fn start(pool: &PgPool, stage: &str) -> StoreResult<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO pipeline_runs (stage, items_processed, items_errored, started_at) VALUES ($1, 0, 0, $2) RETURNING id",
    )
    .bind(stage)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Closes out a run with final counts. `pipeline_runs` is an audit log —
/// once finished, a row is never updated again.
pub async fn finish(pool: &PgPool, id: Uuid, items_processed: i32, items_errored: i32) -> StoreResult<()> {
    sqlx::query(
        "UPDATE pipeline_runs SET items_processed = $2, items_errored = $3, finished_at = $4 WHERE id = $1",
    )
    .bind(id)
    .bind(items_processed)
    .bind(items_errored)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}
