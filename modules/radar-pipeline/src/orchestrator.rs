use std::sync::Arc;
use std::time::Duration;

use radar_common::{content_hash, Config, PipelineStatus};
use radar_llm::LlmClient;
use radar_store::{items, pipeline_runs, PgPool};

use crate::linker::AliasIndex;
use crate::telegram::TelegramSink;

pub const BATCH_SIZE: i64 = 40;
pub const PIPELINE_INTERVAL: Duration = Duration::from_secs(15);

/// Drives the pipeline forever: one pass each of normalize, link,
/// extract over claimed batches, then entity promotion, one theme
/// clustering cycle, alert triage, and a fixed sleep before repeating.
/// Every stage is its own audited `pipeline_runs` row; a stage that
/// errors out entirely is logged and the loop continues rather than
/// crashing the process.
pub async fn run_forever(pool: PgPool, llm: Arc<LlmClient>, config: Arc<Config>) -> anyhow::Result<()> {
    let alias_index = Arc::new(AliasIndex::empty());
    alias_index.reload(&pool).await?;
    let sink = TelegramSink::from_config(&config);

    loop {
        if let Err(e) = run_stage(&pool, "normalize", |pool| process_normalize_batch(pool, &llm)).await {
            tracing::error!(error = %e, "normalize stage failed");
        }
        if let Err(e) = run_stage(&pool, "link", |pool| process_link_batch(pool, &alias_index)).await {
            tracing::error!(error = %e, "link stage failed");
        }
        if let Err(e) = run_stage(&pool, "extract", |pool| process_extract_batch(pool, &llm)).await {
            tracing::error!(error = %e, "extract stage failed");
        }

        match crate::discovery::promote_entities(&pool).await {
            Ok(promoted) if !promoted.is_empty() => {
                if let Err(e) = alias_index.reload(&pool).await {
                    tracing::error!(error = %e, "alias index reload failed after promotion");
                }
            }
            Err(e) => tracing::error!(error = %e, "entity promotion failed"),
            _ => {}
        }

        if let Err(e) = crate::lifecycle::run_cycle(&pool, &llm).await {
            tracing::error!(error = %e, "theme lifecycle cycle failed");
        }

        if let Err(e) = crate::triage::run_triage(&pool, &sink, &config).await {
            tracing::error!(error = %e, "alert triage failed");
        }

        tokio::time::sleep(PIPELINE_INTERVAL).await;
    }
}

async fn run_stage<F, Fut>(pool: &PgPool, stage: &str, f: F) -> anyhow::Result<()>
where
    F: FnOnce(&PgPool) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<(i32, i32)>>,
{
    let run_id = pipeline_runs::start(pool, stage).await?;
    let (processed, errored) = f(pool).await?;
    pipeline_runs::finish(pool, run_id, processed, errored).await?;
    Ok(())
}

/// COLLECTED -> NORMALIZED: detect language, translate to English when
/// needed, and compute the content hash once raw text is settled.
async fn process_normalize_batch(pool: &PgPool, llm: &LlmClient) -> anyhow::Result<(i32, i32)> {
    let batch = items::claim_batch(pool, PipelineStatus::Collected, PipelineStatus::Normalized, BATCH_SIZE).await?;
    let mut processed = 0;
    let mut errored = 0;

    for item in &batch {
        let text = item.raw_text.as_deref().unwrap_or("");
        let (language, _confidence) = crate::lang::detect_language(text);
        let (text_en, translation_confidence) = crate::lang::translate_to_english(llm, text, &language).await;
        let digest = content_hash(&text_en);

        match items::set_normalized(pool, item.id, Some(&text_en), Some(translation_confidence), Some(&digest)).await {
            Ok(()) => processed += 1,
            Err(e) => {
                tracing::warn!(item_id = %item.id, error = %e, "normalize failed");
                let _ = items::set_error(pool, item.id, "normalize_failed").await;
                errored += 1;
            }
        }
    }

    Ok((processed, errored))
}

/// NORMALIZED -> LINKED: find every known entity alias in the item's
/// English text and record the mentions.
async fn process_link_batch(pool: &PgPool, alias_index: &AliasIndex) -> anyhow::Result<(i32, i32)> {
    let batch = items::claim_batch(pool, PipelineStatus::Normalized, PipelineStatus::Linked, BATCH_SIZE).await?;
    let mut processed = 0;
    let mut errored = 0;

    for item in &batch {
        let text = item.text_en.as_deref().unwrap_or("");
        let mentions = crate::linker::link_entities_in_text(alias_index, text);
        match crate::linker::store_entity_mentions(pool, item.id, &mentions).await {
            Ok(()) => processed += 1,
            Err(e) => {
                tracing::warn!(item_id = %item.id, error = %e, "link failed");
                let _ = items::set_error(pool, item.id, "link_failed").await;
                errored += 1;
            }
        }
    }

    Ok((processed, errored))
}

/// LINKED -> EXTRACTED -> DONE: run event extraction and persist every
/// validated event. An item reaches DONE whether or not it yielded any
/// events — extraction finding nothing is a normal outcome, not a
/// failure.
async fn process_extract_batch(pool: &PgPool, llm: &LlmClient) -> anyhow::Result<(i32, i32)> {
    let batch = items::claim_batch(pool, PipelineStatus::Linked, PipelineStatus::Extracted, BATCH_SIZE).await?;
    let mut processed = 0;
    let mut errored = 0;

    for item in &batch {
        let source = radar_store::sources::get(pool, &item.source_id).await?;
        let result = crate::extractor::extract_events(llm, item, source.as_ref()).await;
        match crate::extractor::persist_events(pool, item.id, &result).await {
            Ok(_) => {
                let _ = items::set_status(pool, item.id, PipelineStatus::Done).await;
                processed += 1;
            }
            Err(e) => {
                tracing::warn!(item_id = %item.id, error = %e, "event persistence failed");
                let _ = items::set_error(pool, item.id, "extract_persist_failed").await;
                errored += 1;
            }
        }
    }

    Ok((processed, errored))
}
