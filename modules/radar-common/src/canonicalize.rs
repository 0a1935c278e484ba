use sha2::{Digest, Sha256};
use url::Url;

/// Tracking query parameters stripped during canonicalization.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "fbclid",
    "gclid",
    "ref",
    "source",
    "mc_cid",
    "mc_eid",
];

/// Canonicalizes a URL for dedup purposes: lowercases scheme and host,
/// strips a leading `www.`, drops the fragment, removes tracking
/// parameters, sorts the remaining parameters by key, and strips a
/// trailing slash from the path (an empty path becomes `/`).
///
/// Returns the original string unchanged if it fails to parse as a URL —
/// canonicalization is best-effort, never fatal.
pub fn canonicalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    let scheme = parsed.scheme().to_lowercase();
    let _ = parsed.set_scheme(&scheme);

    if let Some(host) = parsed.host_str() {
        let mut host = host.to_lowercase();
        if let Some(stripped) = host.strip_prefix("www.") {
            host = stripped.to_string();
        }
        let _ = parsed.set_host(Some(&host));
    }

    parsed.set_fragment(None);

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));
    if params.is_empty() {
        parsed.set_query(None);
    } else {
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let path = parsed.path().to_string();
    let trimmed = path.strip_suffix('/').unwrap_or(&path);
    let new_path = if trimmed.is_empty() { "/" } else { trimmed };
    parsed.set_path(new_path);

    parsed.to_string()
}

/// SHA-256 of the canonical URL form, hex-encoded.
pub fn url_hash(raw: &str) -> String {
    let canonical = canonicalize_url(raw);
    hex_sha256(canonical.as_bytes())
}

/// SHA-256 over the text with runs of whitespace collapsed to a single
/// space, hex-encoded.
pub fn content_hash(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    hex_sha256(collapsed.as_bytes())
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_is_idempotent() {
        let url = "HTTPS://WWW.Example.com/foo/?utm_source=x&b=2&a=1#frag";
        let once = canonicalize_url(url);
        let twice = canonicalize_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn canonicalize_drops_tracking_params_and_sorts_rest() {
        let with_tracking = canonicalize_url("https://example.com/a?utm_source=x&b=2&a=1&fbclid=y");
        let without_tracking = canonicalize_url("https://example.com/a?a=1&b=2");
        assert_eq!(with_tracking, without_tracking);
    }

    #[test]
    fn canonicalize_ignores_host_case_www_and_trailing_slash() {
        let a = canonicalize_url("https://www.Example.com/Path/");
        let b = canonicalize_url("https://example.com/Path");
        assert_eq!(a, b);
    }

    #[test]
    fn canonicalize_empty_path_becomes_slash() {
        let url = canonicalize_url("https://example.com");
        assert!(url.ends_with('/'));
    }

    #[test]
    fn url_hash_matches_for_equivalent_urls() {
        let a = url_hash("https://example.com/story?utm_campaign=z&ref=abc");
        let b = url_hash("https://EXAMPLE.com/story");
        assert_eq!(a, b);
    }

    #[test]
    fn content_hash_invariant_under_whitespace_collapse() {
        let a = content_hash("hello   world\n\nfoo");
        let b = content_hash("hello world foo");
        assert_eq!(a, b);
    }

    #[test]
    fn content_hash_differs_for_different_text() {
        assert_ne!(content_hash("foo"), content_hash("bar"));
    }
}
