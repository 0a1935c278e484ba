use radar_llm::{CallOptions, LlmClient};
use whatlang::{detect, Lang};

const MIN_DETECTABLE_CHARS: usize = 10;

/// Detects the dominant language of `text`, returning an ISO 639-1 code
/// and a confidence in [0, 1]. Text shorter than ten characters is
/// assumed English with zero confidence rather than guessed at — too
/// little signal to trust a classifier.
pub fn detect_language(text: &str) -> (String, f64) {
    if text.trim().chars().count() < MIN_DETECTABLE_CHARS {
        return ("en".to_string(), 0.0);
    }

    match detect(text) {
        Some(info) if SUPPORTED.contains(&iso_code(info.lang())) => {
            let confidence = (info.confidence() * 1000.0).round() / 1000.0;
            (iso_code(info.lang()).to_string(), confidence)
        }
        Some(_) | None => ("en".to_string(), 0.0),
    }
}

const SUPPORTED: &[&str] = &["en", "ja", "ko", "zh", "de", "fr", "es", "pt", "hi"];

fn iso_code(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Cmn => "zh",
        Lang::Deu => "de",
        Lang::Fra => "fr",
        Lang::Spa => "es",
        Lang::Por => "pt",
        Lang::Hin => "hi",
        _ => "en",
    }
}

const TRANSLATE_SYSTEM: &str = "You translate non-English news and filings text into English. \
Preserve numbers, units, dates, percentages, and currency amounts exactly. \
Keep company names and stock tickers in their most recognizable English form \
(for example 台積電 becomes TSMC). Do not add commentary, explanation, or \
formatting — output only the translated text.";

const MIN_TRANSLATABLE_CHARS: usize = 20;
const MAX_TRANSLATE_CHARS: usize = 15_000;

/// Translates `text` to English via the LLM. English input passes
/// through unchanged with confidence 1.0. Short input and failures
/// return the original text with confidence 0.0 — a translation that
/// didn't happen is never worse than silently fabricating one.
pub async fn translate_to_english(llm: &LlmClient, text: &str, language: &str) -> (String, f64) {
    if language == "en" {
        return (text.to_string(), 1.0);
    }
    if text.trim().chars().count() < MIN_TRANSLATABLE_CHARS {
        return (text.to_string(), 0.0);
    }

    let truncated: String = text.chars().take(MAX_TRANSLATE_CHARS).collect();

    match llm
        .complete(Some(TRANSLATE_SYSTEM), &truncated, CallOptions::default())
        .await
    {
        Ok(translated) => {
            let confidence = if truncated.chars().count() < 5000 { 0.85 } else { 0.75 };
            (translated, confidence)
        }
        Err(e) => {
            tracing::warn!(error = %e, "translation failed, keeping original text");
            (text.to_string(), 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_assumed_english_zero_confidence() {
        assert_eq!(detect_language("hi"), ("en".to_string(), 0.0));
        assert_eq!(detect_language(""), ("en".to_string(), 0.0));
    }

    #[test]
    fn detects_english_prose() {
        let (lang, confidence) =
            detect_language("The quarterly earnings report showed strong growth in cloud revenue.");
        assert_eq!(lang, "en");
        assert!(confidence >= 0.0);
    }
}
