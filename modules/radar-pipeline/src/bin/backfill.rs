use std::sync::Arc;

use clap::Parser;
use radar_common::{Config, PipelineStatus};
use radar_llm::{LlmClient, LlmConfig};
use radar_store::items;

/// Re-runs extraction over items already marked DONE, for use after an
/// extraction prompt or schema change makes re-processing worthwhile.
/// Unlike the live orchestrator this walks a fixed snapshot rather than
/// looping forever.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "LLM_CONFIG_PATH", default_value = "config/llm.yaml")]
    llm_config: std::path::PathBuf,

    #[arg(long, env = "MIGRATIONS_DIR", default_value = "modules/radar-store/migrations")]
    migrations_dir: std::path::PathBuf,

    #[arg(long, default_value_t = 40)]
    batch_size: i64,

    #[arg(long, default_value_t = 0)]
    max_batches: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = Config::from_env();
    let pool = radar_store::connect(&config.database_url, &args.migrations_dir).await?;

    let llm_config = LlmConfig::load(&args.llm_config)?;
    let llm = Arc::new(LlmClient::new(config.openrouter_api_key.clone(), llm_config, config.llm_concurrency));

    let mut batches_run = 0u32;
    loop {
        // Re-claim DONE items back through EXTRACTED so the normal
        // extract-batch machinery can process them a second time.
        let batch = items::claim_batch(&pool, PipelineStatus::Done, PipelineStatus::Extracted, args.batch_size).await?;
        if batch.is_empty() {
            break;
        }

        for item in &batch {
            let source = radar_store::sources::get(&pool, &item.source_id).await?;
            let result = radar_pipeline::extractor::extract_events(&llm, item, source.as_ref()).await;
            match radar_pipeline::extractor::persist_events(&pool, item.id, &result).await {
                Ok(count) => {
                    tracing::info!(item_id = %item.id, events = count, "backfilled");
                    items::set_status(&pool, item.id, PipelineStatus::Done).await?;
                }
                Err(e) => {
                    tracing::warn!(item_id = %item.id, error = %e, "backfill failed");
                    items::set_error(&pool, item.id, "backfill_failed").await?;
                }
            }
        }

        batches_run += 1;
        if args.max_batches > 0 && batches_run >= args.max_batches {
            break;
        }
    }

    tracing::info!(batches = batches_run, "backfill complete");
    Ok(())
}
