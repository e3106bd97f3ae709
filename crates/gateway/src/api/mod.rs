pub mod auth;
pub mod deals;
pub mod error;
pub mod games;
pub mod guard;
pub mod health;
pub mod history;
pub mod players;
pub mod validate;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Three tiers:
/// - **public** — `/`, `/health`, and `/auth/login` (login runs its own
///   signature check inside the handler);
/// - **bearer-only** — the doc endpoints;
/// - **bearer + signed** — everything under `/api/*`.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login));

    let docs = Router::new()
        .route("/docs", get(health::docs))
        .route("/openapi.json", get(health::openapi_spec))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_bearer,
        ));

    let api = Router::new()
        .route("/api/games", get(games::list_games))
        .route("/api/games/tags/batch", post(games::tags_batch))
        .route("/api/games/by-genre/:genre", get(games::by_genre))
        .route("/api/games/by-category/:category", get(games::by_category))
        .route("/api/games/:appid", get(games::get_game))
        .route("/api/current-players", get(games::current_players))
        .route("/api/genres", get(games::genres))
        .route("/api/categories", get(games::categories))
        .route("/api/owned-games/:steam_id", get(players::owned_games))
        .route("/api/recently-played/:steam_id", get(players::recently_played))
        .route("/api/player-summary/:steam_id", get(players::player_summary))
        .route("/api/coming-soon", get(players::coming_soon))
        .route("/api/resolve-vanity/:name", get(players::resolve_vanity))
        .route("/api/player-history/compare", post(history::compare))
        .route("/api/deals/best", get(deals::best))
        .route("/api/deals/search", get(deals::search))
        .route("/api/deals/game/:appid", get(deals::for_game))
        // Outer layer runs first: bearer check, then signature check.
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_signature,
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            guard::require_bearer,
        ));

    public
        .merge(docs)
        .merge(api)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
