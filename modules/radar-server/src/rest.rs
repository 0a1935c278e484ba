use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::warn;

use radar_store::events::{self, EventFilter};
use radar_store::{sources, themes};

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/heatmap", get(heatmap))
        .route("/api/themes", get(list_themes))
        .route("/api/themes/{id}", get(theme_detail))
        .route("/api/events", get(list_events))
        .route("/api/sources", get(list_sources))
        .route("/api/sources/stats", get(source_stats))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Deserialize)]
pub struct HeatmapQuery {
    weeks: Option<i64>,
}

async fn heatmap(State(state): State<Arc<AppState>>, Query(params): Query<HeatmapQuery>) -> impl IntoResponse {
    let weeks = params.weeks.unwrap_or(12).clamp(1, 52);
    match events::heatmap(&state.pool, weeks).await {
        Ok(cells) => {
            let mut by_layer: std::collections::BTreeMap<String, Vec<serde_json::Value>> = std::collections::BTreeMap::new();
            for cell in cells {
                let net = cell.tightening - cell.easing;
                let score = if cell.event_count > 0 {
                    (net as f64 / cell.event_count.max(1) as f64).clamp(-1.0, 1.0)
                } else {
                    0.0
                };
                by_layer.entry(cell.constraint_layer.clone()).or_default().push(serde_json::json!({
                    "week": cell.week_start,
                    "event_count": cell.event_count,
                    "tightening": cell.tightening,
                    "easing": cell.easing,
                    "score": (score * 100.0).round() / 100.0,
                }));
            }
            Json(serde_json::json!({ "weeks": weeks, "heatmap": by_layer })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to load heatmap");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct ThemesQuery {
    status: Option<String>,
    limit: Option<i64>,
}

async fn list_themes(State(state): State<Arc<AppState>>, Query(params): Query<ThemesQuery>) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    match themes::list_by_status(&state.pool, params.status.as_deref(), limit).await {
        Ok(themes) => Json(serde_json::json!({ "themes": themes })).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to list themes");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn theme_detail(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    match themes::get(&state.pool, &id).await {
        Ok(Some(theme)) => Json(serde_json::json!({ "theme": theme })).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load theme");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct EventsQuery {
    layer: Option<String>,
    direction: Option<String>,
    event_type: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_events(State(state): State<Arc<AppState>>, Query(params): Query<EventsQuery>) -> impl IntoResponse {
    let filter = EventFilter {
        layer: params.layer,
        direction: params.direction,
        event_type: params.event_type,
        limit: params.limit.unwrap_or(50).clamp(1, 500),
        offset: params.offset.unwrap_or(0).max(0),
    };
    match events::list(&state.pool, filter).await {
        Ok(events) => Json(serde_json::json!({ "events": events })).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to list events");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct SourcesQuery {
    status: Option<String>,
    fetch_method: Option<String>,
    limit: Option<i64>,
}

async fn list_sources(State(state): State<Arc<AppState>>, Query(params): Query<SourcesQuery>) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let result = match params.status.as_deref() {
        Some(status) => match status.parse() {
            Ok(status) => sources::list_by_status(&state.pool, status).await,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        },
        None => sources::list_all(&state.pool, params.fetch_method.as_deref(), limit).await,
    };
    match result {
        Ok(sources) => Json(serde_json::json!({ "sources": sources })).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to list sources");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn source_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match sources::stats(&state.pool).await {
        Ok(stats) => {
            let rows: Vec<_> = stats
                .into_iter()
                .map(|s| serde_json::json!({ "status": s.status, "fetch_method": s.fetch_method, "count": s.count }))
                .collect();
            Json(serde_json::json!({ "stats": rows })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to load source stats");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
