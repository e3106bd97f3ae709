//! Player-facing pass-through endpoints (upstream-backed).
//!
//! Vanity identifiers are resolved upstream before the profile call;
//! definite not-found maps to 404, transient upstream failure to 503.

use axum::extract::{Path, State};
use axum::response::Json;

use super::error::ApiError;
use super::validate::{parse_steam_ident, SteamIdent};
use crate::state::AppState;

/// Resolve a path identifier down to a bare 17-digit id.
async fn resolve_ident(state: &AppState, raw: &str) -> Result<String, ApiError> {
    match parse_steam_ident(raw)? {
        SteamIdent::Id64(id) => Ok(id),
        SteamIdent::Vanity(name) => state
            .steam
            .resolve_vanity(&name)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("vanity name {name:?} did not resolve"))),
    }
}

// ── GET /api/owned-games/:steam_id ──────────────────────────────────

pub async fn owned_games(
    State(state): State<AppState>,
    Path(steam_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = resolve_ident(&state, &steam_id).await?;
    let games = state.steam.get_owned_games(&id).await?;
    Ok(Json(serde_json::json!({ "games": games })))
}

// ── GET /api/recently-played/:steam_id ──────────────────────────────

pub async fn recently_played(
    State(state): State<AppState>,
    Path(steam_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = resolve_ident(&state, &steam_id).await?;
    let games = state.steam.get_recently_played(&id).await?;
    Ok(Json(serde_json::json!({ "games": games })))
}

// ── GET /api/player-summary/:steam_id ───────────────────────────────

pub async fn player_summary(
    State(state): State<AppState>,
    Path(steam_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = resolve_ident(&state, &steam_id).await?;
    match state.steam.get_player_summary(&id).await? {
        Some(summary) => Ok(Json(serde_json::json!(summary))),
        None => Err(ApiError::NotFound(format!("no profile for {id}"))),
    }
}

// ── GET /api/coming-soon ────────────────────────────────────────────

pub async fn coming_soon(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let games = state.steam.get_coming_soon().await?;
    Ok(Json(serde_json::json!({ "games": games })))
}

// ── GET /api/resolve-vanity/:name ───────────────────────────────────

pub async fn resolve_vanity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let steamid = resolve_ident(&state, &name).await?;
    Ok(Json(serde_json::json!({ "steamid": steamid })))
}
