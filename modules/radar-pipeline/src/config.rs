use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// One row of the seed sources YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSource {
    pub source_id: String,
    pub display_name: String,
    pub url: String,
    #[serde(default)]
    pub feed_url: Option<String>,
    pub fetch_method: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_tier")]
    pub tier: i16,
    #[serde(default = "default_reliability")]
    pub reliability: f64,
    #[serde(default = "default_earliness")]
    pub earliness: f64,
    #[serde(default = "default_schedule_minutes")]
    pub schedule_minutes: i32,
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default)]
    pub search_queries: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_language() -> String {
    "en".to_string()
}
fn default_tier() -> i16 {
    2
}
fn default_reliability() -> f64 {
    0.5
}
fn default_earliness() -> f64 {
    0.5
}
fn default_schedule_minutes() -> i32 {
    60
}
fn default_status() -> String {
    "DISCOVERED".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSourcesFile {
    pub sources: Vec<SeedSource>,
}

/// One row of the seed entities YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntity {
    pub entity_id: String,
    pub canonical_name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub aliases: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default)]
    pub ring: Option<String>,
    #[serde(default)]
    pub geo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntitiesFile {
    pub entities: Vec<SeedEntity>,
}

/// Rotating search query taxonomy: per-language query lists plus a map
/// from source id to the languages it draws queries from.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyFile {
    pub queries: HashMap<String, Vec<String>>,
    pub source_language_map: HashMap<String, Vec<String>>,
}

pub fn load_seed_sources(path: &Path) -> anyhow::Result<Vec<SeedSource>> {
    let raw = std::fs::read_to_string(path)?;
    let file: SeedSourcesFile = serde_yaml::from_str(&raw)?;
    Ok(file.sources)
}

pub fn load_seed_entities(path: &Path) -> anyhow::Result<Vec<SeedEntity>> {
    let raw = std::fs::read_to_string(path)?;
    let file: SeedEntitiesFile = serde_yaml::from_str(&raw)?;
    Ok(file.entities)
}

pub fn load_taxonomy(path: &Path) -> anyhow::Result<TaxonomyFile> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}
