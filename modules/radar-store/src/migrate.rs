use std::collections::HashSet;
use std::path::Path;

use sqlx::PgPool;
use tracing::info;

use crate::error::{StoreError, StoreResult};

/// Applies every `*.sql` file under `migrations_dir` that hasn't already
/// been recorded in the `_migrations` ledger table, in lexical filename
/// order. Each migration file must be idempotent with respect to its own
/// object creation (`CREATE TABLE IF NOT EXISTS`, etc.) since a crash
/// between running a migration and recording it in the ledger means it
/// may be re-applied.
pub async fn run_migrations(pool: &PgPool, migrations_dir: &Path) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id SERIAL PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    let applied: HashSet<String> = sqlx::query_scalar::<_, String>("SELECT name FROM _migrations")
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?
        .into_iter()
        .collect();

    let mut entries: Vec<_> = std::fs::read_dir(migrations_dir)
        .map_err(|e| StoreError::Config(format!("cannot read migrations dir: {e}")))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        if applied.contains(&name) {
            continue;
        }
        let sql = std::fs::read_to_string(entry.path())
            .map_err(|e| StoreError::Config(format!("cannot read migration {name}: {e}")))?;

        info!(migration = %name, "applying migration");
        sqlx::raw_sql(&sql)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration {name} failed: {e}")))?;

        sqlx::query("INSERT INTO _migrations (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(&name)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
    }

    Ok(())
}
