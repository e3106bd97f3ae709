//! Game metadata and watchlist read endpoints (store-backed).

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;

use super::error::ApiError;
use super::validate::{validate_appid, validate_appid_list};
use crate::state::AppState;

// ── GET /api/games ──────────────────────────────────────────────────

pub async fn list_games(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let games = state.store.get_all_games().await?;
    Ok(Json(serde_json::json!({ "games": games })))
}

// ── GET /api/games/:appid ───────────────────────────────────────────

pub async fn get_game(
    State(state): State<AppState>,
    Path(appid): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let appid = validate_appid(appid)?;
    match state.store.get_game(appid).await? {
        Some(game) => Ok(Json(serde_json::json!(game))),
        None => Err(ApiError::NotFound(format!("game {appid} not found"))),
    }
}

// ── GET /api/games/by-genre/:genre, /api/games/by-category/:category ─

pub async fn by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let games = state.store.games_by_genre(&genre).await?;
    Ok(Json(serde_json::json!({ "games": games })))
}

pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let games = state.store.games_by_category(&category).await?;
    Ok(Json(serde_json::json!({ "games": games })))
}

// ── POST /api/games/tags/batch ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TagsBatchRequest {
    #[serde(default)]
    appids: Vec<i64>,
}

pub async fn tags_batch(
    State(state): State<AppState>,
    Json(req): Json<TagsBatchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let appids = validate_appid_list(&req.appids)?;
    let tags = state.store.tags_batch(&appids).await?;
    Ok(Json(serde_json::json!({ "tags": tags })))
}

// ── GET /api/current-players ────────────────────────────────────────

pub async fn current_players(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let watched = state.store.list_watched().await?;
    Ok(Json(serde_json::json!({ "games": watched })))
}

// ── GET /api/genres, /api/categories ────────────────────────────────

pub async fn genres(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let genres = state.store.list_genres().await?;
    Ok(Json(serde_json::json!({ "genres": genres })))
}

pub async fn categories(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let categories = state.store.list_categories().await?;
    Ok(Json(serde_json::json!({ "categories": categories })))
}
