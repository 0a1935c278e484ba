use clap::Parser;
use radar_common::{Config, PipelineStatus};
use radar_pipeline::linker::{self, AliasIndex};
use radar_store::items;

/// Rebuilds entity mentions for every item that reached LINKED or later,
/// using the current alias index — for use after seeding new entities
/// or aliases that should retroactively match historical text.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "MIGRATIONS_DIR", default_value = "modules/radar-store/migrations")]
    migrations_dir: std::path::PathBuf,

    #[arg(long, default_value_t = 100)]
    batch_size: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = Config::from_env();
    let pool = radar_store::connect(&config.database_url, &args.migrations_dir).await?;

    let alias_index = AliasIndex::empty();
    alias_index.reload(&pool).await?;

    let mut total = 0usize;
    let mut offset = 0i64;
    loop {
        let batch = items::list_by_status_paginated(&pool, PipelineStatus::Done, args.batch_size, offset).await?;
        if batch.is_empty() {
            break;
        }

        for item in &batch {
            let text = item.text_en.as_deref().unwrap_or("");
            let mentions = linker::link_entities_in_text(&alias_index, text);
            linker::store_entity_mentions(&pool, item.id, &mentions).await?;
            total += mentions.len();
        }

        offset += batch.len() as i64;
    }

    tracing::info!(mentions_written = total, "entity backfill complete");
    Ok(())
}
