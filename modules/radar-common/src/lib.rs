pub mod canonicalize;
pub mod config;
pub mod error;
pub mod types;

pub use canonicalize::{canonicalize_url, content_hash, url_hash};
pub use config::Config;
pub use error::{RadarError, RadarResult};
pub use types::*;

/// Normalizes a name into a slug suitable for an id component: lowercase,
/// non-alphanumeric runs collapsed to a single underscore, truncated to
/// `max_len` characters with leading/trailing underscores trimmed.
///
/// Theme cluster keys and entity slugs use different length caps (60 and
/// 50 respectively) — callers pick the cap that matches their id format
/// rather than this function hardcoding one.
///
/// ```
/// assert_eq!(radar_common::slugify("CoWoS Packaging!", 60), "cowos_packaging");
/// assert_eq!(radar_common::slugify("  Multiple   Spaces  ", 60), "multiple_spaces");
/// ```
pub fn slugify(name: &str, max_len: usize) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut last_was_sep = false;
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = slug.trim_matches('_');
    let truncated: String = trimmed.chars().take(max_len).collect();
    truncated.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation_and_spaces() {
        assert_eq!(slugify("CoWoS Packaging!!", 60), "cowos_packaging");
    }

    #[test]
    fn slugify_truncates_to_max_len() {
        let long = "a".repeat(100);
        assert_eq!(slugify(&long, 50).len(), 50);
    }
}
