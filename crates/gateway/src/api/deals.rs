//! Deal endpoints backed by the optional aggregator collaborator.
//! With the collaborator disabled every endpoint serves empty
//! sequences rather than failing.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;

use super::error::ApiError;
use super::validate::validate_appid;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BestQuery {
    #[serde(default = "d_limit")]
    limit: usize,
    #[serde(default = "d_min_discount")]
    min_discount: f64,
}

fn d_limit() -> usize {
    50
}

fn d_min_discount() -> f64 {
    30.0
}

// ── GET /api/deals/best ─────────────────────────────────────────────

pub async fn best(
    State(state): State<AppState>,
    Query(q): Query<BestQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deals = match &state.deals {
        Some(client) => client.get_current_deals(q.limit, q.min_discount).await?,
        None => Vec::new(),
    };
    Ok(Json(serde_json::json!({ "deals": deals })))
}

// ── GET /api/deals/search?title= ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    title: String,
    #[serde(default = "d_limit")]
    limit: usize,
}

pub async fn search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let title = q.title.trim();
    if title.is_empty() || title.len() > 200 {
        return Err(ApiError::Validation("title must be 1-200 chars".into()));
    }
    let deals = match &state.deals {
        Some(client) => client.get_deals_for_title(title, q.limit).await?,
        None => Vec::new(),
    };
    Ok(Json(serde_json::json!({ "deals": deals })))
}

// ── GET /api/deals/game/:appid ──────────────────────────────────────

pub async fn for_game(
    State(state): State<AppState>,
    Path(appid): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let appid = validate_appid(appid)?;
    let deals = match &state.deals {
        Some(client) => client.get_deals_for_appid(appid).await?,
        None => Vec::new(),
    };
    Ok(Json(serde_json::json!({ "deals": deals })))
}
