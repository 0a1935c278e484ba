use radar_common::{ConstraintEvent, Evidence, ExtractionResult};
use radar_llm::{CallOptions, LlmClient};
use radar_store::{events, Item, PgPool, Source, StoreResult};

const MIN_EXTRACTABLE_CHARS: usize = 50;
const MAX_EXTRACT_CHARS: usize = 12_000;

/// Known commodity-supplier reference table folded into the extraction
/// prompt so the model anchors object names to a fixed vocabulary
/// instead of inventing near-duplicate spellings per article.
const KNOWN_SUPPLIERS: &str = "\
Known suppliers and objects to recognize (use these exact names when they apply):
- Foundry: TSMC, Samsung Foundry, Intel Foundry, GlobalFoundries, UMC, SMIC
- HBM / DRAM: SK Hynix, Samsung, Micron
- Lithography: ASML, Canon, Nikon
- Rare earths / magnets: China Rare Earth Group, MP Materials, Lynas
- Shipping / logistics: Maersk, COSCO, Panama Canal Authority, Suez Canal Authority
- Energy: Saudi Aramco, OPEC+, Gazprom";

fn system_prompt() -> String {
    format!(
        "You extract supply-constraint events from a single news article or filing. \
Read the text and identify concrete events where capacity, allocation, lead times, \
or pricing changed for a named entity or commodity. Respond with a JSON object \
matching the required schema. If the article contains no constraint-relevant event, \
return {{\"events\": [], \"skipped\": true, \"skip_reason\": \"<why>\"}}. \
Only report events the text directly supports — never infer a tightening or easing \
that isn't stated or clearly implied.\n\n{KNOWN_SUPPLIERS}"
    )
}

/// Prefixes the article text with the source's name, tier and language so
/// the model can weigh the claim accordingly — a tier-1 wire report and an
/// anonymous blog post asserting the same thing don't deserve equal trust.
fn user_prompt(source: Option<&Source>, item: &Item, truncated: &str) -> String {
    let name = source.map(|s| s.display_name.as_str()).unwrap_or("unknown source");
    let tier = source.map(|s| s.tier).unwrap_or(2);
    let language = source.map(|s| s.language.as_str()).unwrap_or("en");
    format!("Source: {name} (tier {tier}, {language})\nURL: {}\n\n{truncated}", item.url)
}

/// Runs extraction for one item's English text and returns validated
/// events with their evidence fully populated. Short text and parse
/// failures both resolve to an empty, skipped result rather than an
/// error — an item with nothing to extract is not a pipeline failure.
/// `source` is the item's joined source record, when one could be found;
/// its tier/name/language are folded into both the prompt and the
/// resulting evidence.
pub async fn extract_events(llm: &LlmClient, item: &Item, source: Option<&Source>) -> ExtractionResult {
    let text = item.text_en.as_deref().or(item.raw_text.as_deref()).unwrap_or("");
    if text.trim().chars().count() < MIN_EXTRACTABLE_CHARS {
        return ExtractionResult {
            events: vec![],
            skipped: true,
            skip_reason: Some("text too short to extract".to_string()),
        };
    }

    let truncated: String = text.chars().take(MAX_EXTRACT_CHARS).collect();
    let prompt = user_prompt(source, item, &truncated);
    let opts = CallOptions {
        json_mode: true,
        ..Default::default()
    };

    let raw = match llm.complete(Some(&system_prompt()), &prompt, opts).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(item_id = %item.id, error = %e, "extraction call failed");
            return ExtractionResult {
                events: vec![],
                skipped: true,
                skip_reason: Some(format!("llm call failed: {e}")),
            };
        }
    };

    match serde_json::from_str::<ExtractionResult>(&raw) {
        Ok(mut result) => {
            for event in &mut result.events {
                attach_evidence(event, item, source);
            }
            result
        }
        Err(e) => {
            tracing::warn!(item_id = %item.id, error = %e, "extraction response failed to parse");
            ExtractionResult {
                events: vec![],
                skipped: true,
                skip_reason: Some("malformed extraction response".to_string()),
            }
        }
    }
}

/// Fills in evidence from the item's own metadata rather than trusting
/// whatever (if anything) the model echoed back — source id, url, tier
/// and language are known facts, not something an LLM should originate.
fn attach_evidence(event: &mut ConstraintEvent, item: &Item, source: Option<&Source>) {
    let snippets = event
        .evidence
        .as_ref()
        .map(|e| e.snippets.clone())
        .unwrap_or_default();
    event.evidence = Some(Evidence {
        source_id: item.source_id.clone(),
        source_url: item.url.clone(),
        source_tier: source.map(|s| s.tier).unwrap_or(2),
        language: item.language.clone().unwrap_or_else(|| "en".to_string()),
        translation_used: item.translation_confidence.is_some() && item.translation_confidence != Some(1.0),
        confidence: event.confidence,
        snippets,
    });
}

/// Persists every event in a (possibly empty) extraction result.
pub async fn persist_events(pool: &PgPool, item_id: uuid::Uuid, result: &ExtractionResult) -> StoreResult<usize> {
    let mut stored = 0;
    for event in &result.events {
        events::insert(pool, item_id, event).await?;
        stored += 1;
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use radar_common::PipelineStatus;

    fn sample_item(text_en: Option<&str>) -> Item {
        Item {
            id: uuid::Uuid::new_v4(),
            source_id: "src-1".to_string(),
            url: "https://example.com/a".to_string(),
            url_hash: "hash".to_string(),
            content_hash: None,
            title: None,
            raw_text: None,
            language: Some("en".to_string()),
            text_en: text_en.map(|s| s.to_string()),
            translation_confidence: None,
            published_at: None,
            fetched_at: Utc::now(),
            pipeline_status: PipelineStatus::Linked,
            pipeline_error: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn short_text_is_skipped_without_calling_llm() {
        let config = radar_llm::LlmConfig::from_yaml_str(
            "base_url: https://example.invalid\nmodel: test-model\n",
        )
        .unwrap();
        let client = LlmClient::new("key", config, 1);
        let item = sample_item(Some("too short"));
        let result = extract_events(&client, &item, None).await;
        assert!(result.skipped);
        assert!(result.events.is_empty());
    }
}
