use std::path::Path;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::StoreResult;
use crate::migrate::run_migrations;

/// Opens a connection pool and applies any unapplied migrations under
/// `migrations_dir`. The single entry point every binary (pipeline,
/// server, migrate) uses to get a ready-to-query store.
pub async fn connect(database_url: &str, migrations_dir: &Path) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    run_migrations(&pool, migrations_dir).await?;
    Ok(pool)
}

/// Opens a connection pool without running migrations — for the
/// read-only query server, which should never mutate schema.
pub async fn connect_read_only(database_url: &str) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}
