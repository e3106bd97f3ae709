//! Service identity, health probe, and the bearer-gated doc endpoints.

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Json};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET / — service identity (public)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "steamboard",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /health — liveness probe (public)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db = if state.store.ping().await {
        "connected"
    } else {
        "disconnected"
    };
    let scheduler = if state.scheduler_running.load(Ordering::Relaxed) {
        "running"
    } else {
        "stopped"
    };
    Json(serde_json::json!({ "db": db, "scheduler": scheduler }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /docs — minimal doc page (bearer-gated)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn docs() -> impl IntoResponse {
    Html(
        "<!doctype html><html><head><title>Steamboard API</title></head>\
         <body><h1>Steamboard API</h1>\
         <p>Machine-readable spec at <a href=\"/openapi.json\">/openapi.json</a>.</p>\
         </body></html>",
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /openapi.json — OpenAPI 3.0 spec (bearer-gated)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn openapi_spec() -> impl IntoResponse {
    let spec = serde_json::json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Steamboard API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Player-population aggregation for a curated game watchlist. All /api/* requests carry a bearer token plus an HMAC signature."
        },
        "servers": [{ "url": "/", "description": "Current host" }],
        "components": {
            "securitySchemes": {
                "BearerAuth": { "type": "http", "scheme": "bearer" }
            },
            "schemas": {
                "Error": {
                    "type": "object",
                    "properties": { "detail": { "type": "string" } }
                }
            }
        },
        "security": [{ "BearerAuth": [] }],
        "paths": {
            "/health": {
                "get": {
                    "summary": "Database and scheduler health",
                    "security": [],
                    "responses": { "200": { "description": "Status object" } }
                }
            },
            "/auth/login": {
                "post": {
                    "summary": "Exchange a signed request for a bearer token",
                    "security": [],
                    "requestBody": { "required": true, "content": { "application/json": { "schema": { "type": "object", "required": ["client_id"], "properties": { "client_id": { "type": "string" } } } } } },
                    "responses": { "200": { "description": "Access token" }, "401": { "description": "Bad signature or replay" }, "403": { "description": "Unknown client" } }
                }
            },
            "/api/games": {
                "get": { "summary": "All game metadata", "responses": { "200": { "description": "Array of games" } } }
            },
            "/api/games/{appid}": {
                "get": {
                    "summary": "Single game metadata",
                    "parameters": [{ "name": "appid", "in": "path", "required": true, "schema": { "type": "integer" } }],
                    "responses": { "200": { "description": "Game object" }, "404": { "description": "Not found" } }
                }
            },
            "/api/games/tags/batch": {
                "post": {
                    "summary": "Genre/category sets for up to 100 appids",
                    "requestBody": { "required": true, "content": { "application/json": { "schema": { "type": "object", "required": ["appids"], "properties": { "appids": { "type": "array", "items": { "type": "integer" }, "maxItems": 100 } } } } } },
                    "responses": { "200": { "description": "Tag map" }, "422": { "description": "Oversized or empty list" } }
                }
            },
            "/api/current-players": {
                "get": { "summary": "Watchlist with latest counts", "responses": { "200": { "description": "Array of watched games" } } }
            },
            "/api/genres": {
                "get": { "summary": "Distinct genres", "responses": { "200": { "description": "Sorted list" } } }
            },
            "/api/categories": {
                "get": { "summary": "Distinct categories", "responses": { "200": { "description": "Sorted list" } } }
            },
            "/api/owned-games/{steam_id}": {
                "get": {
                    "summary": "Owned library for a player",
                    "parameters": [{ "name": "steam_id", "in": "path", "required": true, "schema": { "type": "string" } }],
                    "responses": { "200": { "description": "Array of games" }, "503": { "description": "Upstream unavailable" } }
                }
            },
            "/api/player-history/compare": {
                "post": {
                    "summary": "5-minute series for a batch of appids",
                    "responses": { "200": { "description": "Per-app series map" } }
                }
            },
            "/api/deals/best": {
                "get": { "summary": "Current best deals", "responses": { "200": { "description": "Array of deals" } } }
            }
        }
    });
    ([(header::CONTENT_TYPE, "application/json")], Json(spec))
}
