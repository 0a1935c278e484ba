use chrono::{DateTime, Utc};
use uuid::Uuid;

use radar_common::{
    ConstraintLayer, EntityStatus, EntityType, FetchMethod, PipelineStatus, SourceStatus,
    ThemeStatus,
};

/// Raw `sources` row. Enum columns are stored as TEXT and parsed on read
/// by the query layer rather than via a custom `sqlx::Type` impl — keeps
/// the row shape identical to the table and the conversion failure mode
/// explicit (a bad value is a schema violation, not a silent default).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceRow {
    pub source_id: String,
    pub display_name: String,
    pub url: String,
    pub feed_url: Option<String>,
    pub fetch_method: String,
    pub language: String,
    pub tier: i16,
    pub reliability: f64,
    pub earliness: f64,
    pub schedule_minutes: i32,
    pub layers: Vec<String>,
    pub search_queries: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Source {
    pub source_id: String,
    pub display_name: String,
    pub url: String,
    pub feed_url: Option<String>,
    pub fetch_method: FetchMethod,
    pub language: String,
    pub tier: i16,
    pub reliability: f64,
    pub earliness: f64,
    pub schedule_minutes: i32,
    pub layers: Vec<ConstraintLayer>,
    pub search_queries: Vec<String>,
    pub status: SourceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SourceRow> for Source {
    type Error = String;

    fn try_from(row: SourceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            fetch_method: row.fetch_method.parse()?,
            status: row.status.parse()?,
            layers: row
                .layers
                .iter()
                .map(|l| l.parse())
                .collect::<Result<Vec<_>, _>>()?,
            source_id: row.source_id,
            display_name: row.display_name,
            url: row.url,
            feed_url: row.feed_url,
            language: row.language,
            tier: row.tier,
            reliability: row.reliability,
            earliness: row.earliness,
            schedule_minutes: row.schedule_minutes,
            search_queries: row.search_queries,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub id: Uuid,
    pub source_id: String,
    pub url: String,
    pub url_hash: String,
    pub content_hash: Option<String>,
    pub title: Option<String>,
    pub raw_text: Option<String>,
    pub language: Option<String>,
    pub text_en: Option<String>,
    pub translation_confidence: Option<f64>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub pipeline_status: String,
    pub pipeline_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Item {
    pub id: Uuid,
    pub source_id: String,
    pub url: String,
    pub url_hash: String,
    pub content_hash: Option<String>,
    pub title: Option<String>,
    pub raw_text: Option<String>,
    pub language: Option<String>,
    pub text_en: Option<String>,
    pub translation_confidence: Option<f64>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub pipeline_status: PipelineStatus,
    pub pipeline_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = String;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            pipeline_status: row.pipeline_status.parse()?,
            id: row.id,
            source_id: row.source_id,
            url: row.url,
            url_hash: row.url_hash,
            content_hash: row.content_hash,
            title: row.title,
            raw_text: row.raw_text,
            language: row.language,
            text_en: row.text_en,
            translation_confidence: row.translation_confidence,
            published_at: row.published_at,
            fetched_at: row.fetched_at,
            pipeline_error: row.pipeline_error,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntityRow {
    pub entity_id: String,
    pub canonical_name: String,
    pub entity_type: String,
    pub aliases: serde_json::Value,
    pub tickers: Vec<String>,
    pub roles: Vec<String>,
    pub layers: Vec<String>,
    pub ring: Option<String>,
    pub geo: Option<String>,
    pub status: String,
    pub mention_count: i32,
    pub discovered_from_item: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Entity {
    pub entity_id: String,
    pub canonical_name: String,
    pub entity_type: EntityType,
    pub aliases: std::collections::HashMap<String, Vec<String>>,
    pub tickers: Vec<String>,
    pub roles: Vec<String>,
    pub layers: Vec<ConstraintLayer>,
    pub ring: Option<String>,
    pub geo: Option<String>,
    pub status: EntityStatus,
    pub mention_count: i32,
    pub discovered_from_item: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EntityRow> for Entity {
    type Error = String;

    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        let aliases = serde_json::from_value(row.aliases)
            .map_err(|e| format!("bad aliases json for {}: {e}", row.entity_id))?;
        Ok(Self {
            entity_type: row.entity_type.parse()?,
            status: row.status.parse()?,
            layers: row
                .layers
                .iter()
                .map(|l| l.parse())
                .collect::<Result<Vec<_>, _>>()?,
            entity_id: row.entity_id,
            canonical_name: row.canonical_name,
            aliases,
            tickers: row.tickers,
            roles: row.roles,
            ring: row.ring,
            geo: row.geo,
            mention_count: row.mention_count,
            discovered_from_item: row.discovered_from_item,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntityMentionRow {
    pub id: Uuid,
    pub entity_id: String,
    pub item_id: Uuid,
    pub context_snippet: String,
    pub layer_hint: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct EventRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub event_type: String,
    pub constraint_layer: String,
    pub secondary_layer: Option<String>,
    pub direction: String,
    pub entities: serde_json::Value,
    pub objects: serde_json::Value,
    pub magnitude: serde_json::Value,
    pub timing: serde_json::Value,
    pub evidence: serde_json::Value,
    pub tags: Vec<String>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ThemeRow {
    pub theme_id: String,
    pub name: String,
    pub constraint_layer: String,
    pub status: String,
    pub velocity_score: f64,
    pub breadth_score: f64,
    pub quality_score: f64,
    pub allocation_score: f64,
    pub novelty_score: f64,
    pub tightening_score: f64,
    pub event_count: i32,
    pub tightening_count: i32,
    pub easing_count: i32,
    pub unique_entities: i32,
    pub unique_sources: i32,
    pub thesis: Option<serde_json::Value>,
    pub first_seen_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Theme {
    pub theme_id: String,
    pub name: String,
    pub constraint_layer: ConstraintLayer,
    pub status: ThemeStatus,
    pub velocity_score: f64,
    pub breadth_score: f64,
    pub quality_score: f64,
    pub allocation_score: f64,
    pub novelty_score: f64,
    pub tightening_score: f64,
    pub event_count: i32,
    pub tightening_count: i32,
    pub easing_count: i32,
    pub unique_entities: i32,
    pub unique_sources: i32,
    pub thesis: Option<radar_common::ThemeThesis>,
    pub first_seen_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ThemeRow> for Theme {
    type Error = String;

    fn try_from(row: ThemeRow) -> Result<Self, Self::Error> {
        let thesis = row
            .thesis
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| format!("bad thesis json for {}: {e}", row.theme_id))?;
        Ok(Self {
            constraint_layer: row.constraint_layer.parse()?,
            status: row.status.parse()?,
            theme_id: row.theme_id,
            name: row.name,
            velocity_score: row.velocity_score,
            breadth_score: row.breadth_score,
            quality_score: row.quality_score,
            allocation_score: row.allocation_score,
            novelty_score: row.novelty_score,
            tightening_score: row.tightening_score,
            event_count: row.event_count,
            tightening_count: row.tightening_count,
            easing_count: row.easing_count,
            unique_entities: row.unique_entities,
            unique_sources: row.unique_sources,
            thesis,
            first_seen_at: row.first_seen_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    pub id: Uuid,
    pub alert_type: String,
    pub theme_id: Option<String>,
    pub payload: serde_json::Value,
    pub telegram_message_id: Option<String>,
    pub dedup_key: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PipelineRunRow {
    pub id: Uuid,
    pub stage: String,
    pub items_processed: i32,
    pub items_errored: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}
