use radar_common::{canonicalize_url, content_hash, url_hash, FetchMethod};
use radar_store::items::NewItem;
use radar_store::{items, Source};

/// Per-sweep ceilings on the expensive fetch methods (spec 4.2): a feed
/// poll is cheap and runs every cycle, but headless rendering, PDF
/// fetches, and search queries cost real money or wall-clock time and
/// are capped per source per sweep.
const MAX_PDF_PER_SWEEP: usize = 10;
const MAX_SCRAPE_PER_SWEEP: usize = 20;
const MAX_SEARCH_QUERIES_PER_SWEEP: usize = 3;

pub struct FetchedDocument {
    pub url: String,
    pub title: Option<String>,
    pub raw_text: String,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Runs one fetch sweep for a single source and inserts every new
/// document as a COLLECTED item. Returns the number of items actually
/// inserted (re-fetched duplicates, detected via `url_hash`, don't
/// count). A fetch-method failure for one document is logged and
/// skipped rather than aborting the whole sweep.
pub async fn sweep_source(pool: &radar_store::PgPool, http: &reqwest::Client, source: &Source) -> anyhow::Result<usize> {
    let documents = match source.fetch_method {
        FetchMethod::Feed => fetch_feed(http, source).await?,
        FetchMethod::Html => fetch_html(http, source).await?,
        FetchMethod::Headless => fetch_headless_stub(source),
        FetchMethod::Pdf => fetch_pdf_stub(source),
        FetchMethod::WebSearch => fetch_web_search_stub(source),
    };

    let capped = cap_documents(source.fetch_method, documents);

    let mut inserted = 0;
    for doc in capped {
        let canonical = canonicalize_url(&doc.url);
        let hash = url_hash(&canonical);
        let content_digest = content_hash(&doc.raw_text);

        let id = items::insert_collected(
            pool,
            NewItem {
                source_id: source.source_id.clone(),
                url: canonical,
                url_hash: hash,
                content_hash: Some(content_digest),
                title: doc.title,
                raw_text: Some(doc.raw_text),
                language: None,
                published_at: doc.published_at,
            },
        )
        .await?;
        if id.is_some() {
            inserted += 1;
        }
    }

    Ok(inserted)
}

fn cap_documents(method: FetchMethod, mut documents: Vec<FetchedDocument>) -> Vec<FetchedDocument> {
    let cap = match method {
        FetchMethod::Pdf => MAX_PDF_PER_SWEEP,
        FetchMethod::Html | FetchMethod::Headless => MAX_SCRAPE_PER_SWEEP,
        FetchMethod::WebSearch => MAX_SEARCH_QUERIES_PER_SWEEP,
        FetchMethod::Feed => documents.len(),
    };
    documents.truncate(cap);
    documents
}

/// RSS/Atom sources — the cheapest, highest-volume fetch method.
async fn fetch_feed(http: &reqwest::Client, source: &Source) -> anyhow::Result<Vec<FetchedDocument>> {
    let feed_url = source.feed_url.as_deref().unwrap_or(&source.url);
    let bytes = http.get(feed_url).send().await?.bytes().await?;
    let feed = feed_rs::parser::parse(&bytes[..])?;

    let documents = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry.links.first()?.href.clone();
            let title = entry.title.map(|t| t.content);
            let raw_text = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            if raw_text.trim().is_empty() {
                return None;
            }
            Some(FetchedDocument {
                url,
                title,
                raw_text,
                published_at: entry.published,
            })
        })
        .collect();

    Ok(documents)
}

/// Single HTML article fetch with boilerplate stripped via the same
/// Readability-style content transform the scraping stack already uses.
async fn fetch_html(http: &reqwest::Client, source: &Source) -> anyhow::Result<Vec<FetchedDocument>> {
    use spider_transformations::transformation::content::{
        transform_content_input, ReturnFormat, TransformConfig, TransformInput,
    };

    let response = http.get(&source.url).send().await?;
    let final_url = response.url().to_string();
    let html = response.text().await?;

    let parsed_url = url::Url::parse(&final_url).ok();
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html.as_bytes(),
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
    };
    let extracted = transform_content_input(input, &config);

    if extracted.trim().is_empty() {
        return Ok(vec![]);
    }

    Ok(vec![FetchedDocument {
        url: final_url,
        title: None,
        raw_text: extracted,
        published_at: None,
    }])
}

/// Headless-browser rendering, PDF extraction, and web search are out
/// of pipeline scope as full implementations — what's modeled here is
/// the dispatcher contract each would fulfill (return zero or more
/// documents for a source) so the rest of the pipeline never needs to
/// know which fetch method produced an item.
fn fetch_headless_stub(_source: &Source) -> Vec<FetchedDocument> {
    Vec::new()
}

fn fetch_pdf_stub(_source: &Source) -> Vec<FetchedDocument> {
    Vec::new()
}

fn fetch_web_search_stub(_source: &Source) -> Vec<FetchedDocument> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_documents_truncates_to_method_ceiling() {
        let docs: Vec<FetchedDocument> = (0..30)
            .map(|i| FetchedDocument {
                url: format!("https://example.com/{i}"),
                title: None,
                raw_text: "text".to_string(),
                published_at: None,
            })
            .collect();
        assert_eq!(cap_documents(FetchMethod::Pdf, docs.iter().map(copy_doc).collect()).len(), 10);
        assert_eq!(cap_documents(FetchMethod::Html, docs.iter().map(copy_doc).collect()).len(), 20);
        assert_eq!(cap_documents(FetchMethod::WebSearch, docs.iter().map(copy_doc).collect()).len(), 3);
        assert_eq!(cap_documents(FetchMethod::Feed, docs.iter().map(copy_doc).collect()).len(), 30);
    }

    fn copy_doc(d: &FetchedDocument) -> FetchedDocument {
        FetchedDocument {
            url: d.url.clone(),
            title: d.title.clone(),
            raw_text: d.raw_text.clone(),
            published_at: d.published_at,
        }
    }
}
