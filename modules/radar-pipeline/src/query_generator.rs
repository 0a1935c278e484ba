use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::TaxonomyFile;

/// Rotating cursor into each source's per-language query list, persisted
/// to disk so a process restart resumes where it left off rather than
/// re-issuing the same queries every time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Cursors {
    #[serde(default)]
    by_source: HashMap<String, usize>,
}

pub struct QueryGenerator {
    taxonomy: TaxonomyFile,
    cursor_path: PathBuf,
    cursors: Cursors,
}

impl QueryGenerator {
    pub fn load(taxonomy: TaxonomyFile, cursor_path: impl Into<PathBuf>) -> Self {
        let cursor_path = cursor_path.into();
        let cursors = std::fs::read_to_string(&cursor_path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            taxonomy,
            cursor_path,
            cursors,
        }
    }

    /// Returns the next `count` queries for a source, rotating through
    /// its configured languages' query lists modulo their combined
    /// length so a short list is revisited rather than exhausted.
    pub fn next_queries(&mut self, source_id: &str, count: usize) -> Vec<String> {
        let languages = self
            .taxonomy
            .source_language_map
            .get(source_id)
            .cloned()
            .unwrap_or_else(|| vec!["en".to_string()]);

        let pool: Vec<String> = languages
            .iter()
            .flat_map(|lang| self.taxonomy.queries.get(lang).cloned().unwrap_or_default())
            .collect();

        if pool.is_empty() {
            return Vec::new();
        }

        let cursor = self.cursors.by_source.entry(source_id.to_string()).or_insert(0);
        let mut picked = Vec::with_capacity(count);
        for i in 0..count {
            picked.push(pool[(*cursor + i) % pool.len()].clone());
        }
        *cursor = (*cursor + count) % pool.len();

        picked
    }

    pub fn persist(&self) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(&self.cursors)?;
        if let Some(parent) = self.cursor_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.cursor_path, raw)?;
        Ok(())
    }
}

pub fn default_cursor_path() -> PathBuf {
    Path::new("data").join("query_cursors.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_taxonomy() -> TaxonomyFile {
        let mut queries = HashMap::new();
        queries.insert("en".to_string(), vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        let mut source_language_map = HashMap::new();
        source_language_map.insert("src-1".to_string(), vec!["en".to_string()]);
        TaxonomyFile {
            queries,
            source_language_map,
        }
    }

    #[test]
    fn rotation_wraps_around_pool_length() {
        let dir = std::env::temp_dir().join(format!("radar-qg-test-{}", std::process::id()));
        let mut generator = QueryGenerator::load(sample_taxonomy(), dir.join("cursor.json"));

        let first = generator.next_queries("src-1", 2);
        assert_eq!(first, vec!["a".to_string(), "b".to_string()]);
        let second = generator.next_queries("src-1", 2);
        assert_eq!(second, vec!["c".to_string(), "a".to_string()]);
    }

    #[test]
    fn unknown_source_falls_back_to_english() {
        let dir = std::env::temp_dir().join(format!("radar-qg-test2-{}", std::process::id()));
        let mut generator = QueryGenerator::load(sample_taxonomy(), dir.join("cursor.json"));
        let queries = generator.next_queries("unknown-src", 1);
        assert_eq!(queries, vec!["a".to_string()]);
    }
}
