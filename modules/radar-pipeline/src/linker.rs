use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use radar_common::EntityType;
use radar_store::{entities, PgPool, StoreResult};

/// Lowercased-alias → entity_id index, rebuilt wholesale after every
/// discovery or promotion change and read concurrently by link workers.
/// Readers see a consistent snapshot; writers replace the map under a
/// single lock rather than mutating it in place.
pub struct AliasIndex {
    inner: RwLock<HashMap<String, String>>,
}

impl AliasIndex {
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuilds the index from every entity's canonical name and alias
    /// set. Non-ASCII aliases are also indexed with internal whitespace
    /// stripped, matching how CJK text is tokenized downstream.
    pub async fn reload(&self, pool: &PgPool) -> StoreResult<()> {
        let all = entities::list_all(pool).await?;
        let mut map = HashMap::new();
        for entity in &all {
            let mut names: Vec<String> = vec![entity.canonical_name.clone()];
            for aliases in entity.aliases.values() {
                names.extend(aliases.iter().cloned());
            }
            for name in names {
                let lowered = name.to_lowercase();
                map.insert(lowered.clone(), entity.entity_id.clone());
                if !lowered.is_ascii() {
                    let stripped: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();
                    map.entry(stripped).or_insert_with(|| entity.entity_id.clone());
                }
            }
        }
        *self.inner.write().expect("alias index lock poisoned") = map;
        Ok(())
    }

    fn snapshot(&self) -> HashMap<String, String> {
        self.inner.read().expect("alias index lock poisoned").clone()
    }
}

/// A located entity mention: the matched entity id and a snippet of
/// surrounding context (±50 chars).
pub struct Mention {
    pub entity_id: String,
    pub context_snippet: String,
}

/// Finds every known alias in `text`, longest alias first so a longer
/// match (e.g. "Taiwan Semiconductor") wins over a shorter substring
/// ("Semiconductor"). Once an entity has matched once, it is not
/// rematched for the same text. ASCII aliases require a word boundary;
/// non-ASCII aliases match as plain substrings since CJK text has none.
pub fn link_entities_in_text(index: &AliasIndex, text: &str) -> Vec<Mention> {
    let map = index.snapshot();
    let mut aliases: Vec<(&String, &String)> = map.iter().collect();
    aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let lowered = text.to_lowercase();
    let mut matched_entities = std::collections::HashSet::new();
    let mut mentions = Vec::new();

    for (alias, entity_id) in aliases {
        if matched_entities.contains(entity_id) {
            continue;
        }
        let pos = if alias.is_ascii() {
            find_word_boundary_match(&lowered, alias)
        } else {
            lowered.find(alias.as_str())
        };
        if let Some(start) = pos {
            matched_entities.insert(entity_id.clone());
            let snippet_start = start.saturating_sub(50);
            let snippet_end = (start + alias.len() + 50).min(text.len());
            let snippet = safe_slice(text, snippet_start, snippet_end);
            mentions.push(Mention {
                entity_id: entity_id.clone(),
                context_snippet: snippet,
            });
        }
    }

    mentions
}

fn find_word_boundary_match(haystack: &str, needle: &str) -> Option<usize> {
    let mut start = 0;
    while let Some(rel) = haystack[start..].find(needle) {
        let idx = start + rel;
        let before_ok = idx == 0
            || !haystack[..idx]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after_idx = idx + needle.len();
        let after_ok = after_idx >= haystack.len()
            || !haystack[after_idx..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(idx);
        }
        start = idx + 1;
        if start >= haystack.len() {
            break;
        }
    }
    None
}

/// Slices on char boundaries to avoid panicking on multi-byte text.
fn safe_slice(text: &str, start: usize, end: usize) -> String {
    let mut start = start.min(text.len());
    let mut end = end.min(text.len());
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }
    text[start..end].to_string()
}

/// Stores the mentions found in one item's text and bumps each matched
/// entity's mention count.
pub async fn store_entity_mentions(pool: &PgPool, item_id: Uuid, mentions: &[Mention]) -> StoreResult<()> {
    for mention in mentions {
        entities::insert_mention(pool, &mention.entity_id, item_id, &mention.context_snippet, None).await?;
        entities::bump_mention_count(pool, &mention.entity_id).await?;
    }
    Ok(())
}

/// Maps a raw, possibly LLM-generated entity type string onto the
/// closed domain, exposed here since the linker and discovery share it.
pub fn normalize_entity_type(raw: &str) -> EntityType {
    EntityType::normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_match_requires_word_boundary() {
        let haystack = "tsmc reported strong atsmcx results";
        assert_eq!(find_word_boundary_match(haystack, "tsmc"), Some(0));
        let haystack2 = "atsmcx only";
        assert_eq!(find_word_boundary_match(haystack2, "tsmc"), None);
    }

    #[test]
    fn longest_alias_wins_when_both_present() {
        let index = AliasIndex::empty();
        {
            let mut map = index.inner.write().unwrap();
            map.insert("tsmc".to_string(), "E:COMPANY:tsmc".to_string());
            map.insert("taiwan semiconductor".to_string(), "E:COMPANY:tsmc".to_string());
        }
        let mentions = link_entities_in_text(&index, "Taiwan Semiconductor raised prices.");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].entity_id, "E:COMPANY:tsmc");
    }

    #[test]
    fn same_entity_not_matched_twice() {
        let index = AliasIndex::empty();
        {
            let mut map = index.inner.write().unwrap();
            map.insert("tsmc".to_string(), "E:COMPANY:tsmc".to_string());
        }
        let mentions = link_entities_in_text(&index, "tsmc and tsmc again");
        assert_eq!(mentions.len(), 1);
    }
}
