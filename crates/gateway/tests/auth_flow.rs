//! End-to-end auth-boundary tests over the real router.
//!
//! The store is built lazily and never connected: every request here is
//! settled by the gate (or the login handler) before any database work,
//! which is itself part of what these tests assert.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::util::ServiceExt;

use sb_auth::signing::compute_signature;
use sb_auth::{generate_nonce, unix_now, ClientRegistry, NonceCache, SignatureVerifier, TokenIssuer};
use sb_domain::config::Config;
use sb_gateway::api;
use sb_gateway::state::AppState;
use sb_steam::SteamClient;
use sb_store::Store;

const SECRET: &str = "sec";

fn test_state() -> (AppState, Arc<TokenIssuer>) {
    let mut config = Config::default();
    // Point the lazy pool at a dead port; nothing here may touch it.
    config.database.host = "127.0.0.1".into();
    config.database.port = 1;
    config.auth.clients_json = r#"{"cli": "sec"}"#.into();
    config.steam.deals_enabled = false;
    let config = Arc::new(config);

    let store = Store::connect_lazy(&config.database).expect("lazy pool");
    let steam = Arc::new(SteamClient::new(&config.steam).expect("steam client"));
    let registry = ClientRegistry::from_json(&config.auth.clients_json).expect("registry");
    let tokens = Arc::new(TokenIssuer::new(
        &config.auth.token_secret,
        config.auth.token_ttl_secs,
        config.auth.token_leeway_secs,
    ));
    let verifier = Arc::new(SignatureVerifier::new(
        registry,
        NonceCache::new(1024, Duration::from_secs(300)),
        config.auth.timestamp_tolerance_secs,
    ));

    let state = AppState {
        config,
        store,
        steam,
        deals: None,
        tokens: tokens.clone(),
        verifier,
        scheduler_running: Arc::new(AtomicBool::new(true)),
    };
    (state, tokens)
}

fn app(state: AppState) -> Router {
    api::router(state.clone()).with_state(state)
}

/// Build a signed request with fresh timestamp and nonce.
fn signed_request(
    method: &str,
    path: &str,
    body: &[u8],
    client_id: &str,
    secret: &str,
    bearer: Option<&str>,
) -> Request<Body> {
    let timestamp = unix_now().to_string();
    let nonce = generate_nonce();
    let signature = compute_signature(secret, method, path, body, &timestamp, &nonce);

    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .header("x-client-id", client_id)
        .header("x-timestamp", &timestamp)
        .header("x-nonce", &nonce)
        .header("x-signature", &signature);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_vec()))
        .expect("request builds")
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn login_returns_a_decodable_bearer_token() {
    let (state, tokens) = test_state();
    let app = app(state);

    let body = br#"{"client_id":"cli"}"#;
    let resp = app
        .oneshot(signed_request("POST", "/auth/login", body, "cli", SECRET, None))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);

    let json = json_body(resp).await;
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["expires_in"], 1200);
    let token = json["access_token"].as_str().expect("token string");
    let claims = tokens.verify(token).expect("token verifies");
    assert_eq!(claims.client_id, "cli");
}

#[tokio::test]
async fn replayed_login_request_is_rejected() {
    let (state, _) = test_state();
    let app = app(state);

    let body = br#"{"client_id":"cli"}"#;
    let req = signed_request("POST", "/auth/login", body, "cli", SECRET, None);
    // Clone the exact request (same nonce, timestamp, signature).
    let (parts, _) = req.into_parts();
    let rebuild = || {
        let mut b = Request::builder().method("POST").uri("/auth/login");
        for (name, value) in &parts.headers {
            b = b.header(name, value);
        }
        b.body(Body::from(body.to_vec())).expect("request builds")
    };

    let first = app.clone().oneshot(rebuild()).await.expect("response");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(rebuild()).await.expect("response");
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(second).await;
    let detail = json["detail"].as_str().unwrap_or_default();
    assert!(detail.contains("replay"), "detail was {detail:?}");
}

#[tokio::test]
async fn login_with_unknown_client_is_forbidden() {
    let (state, _) = test_state();
    let app = app(state);

    let body = br#"{"client_id":"ghost"}"#;
    let resp = app
        .oneshot(signed_request(
            "POST",
            "/auth/login",
            body,
            "ghost",
            "wrong-secret",
            None,
        ))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let (state, _) = test_state();
    let app = app(state);

    let resp = app
        .oneshot(signed_request("GET", "/api/games", b"", "cli", SECRET, None))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_with_unknown_client_signature_is_forbidden_before_any_db_touch() {
    let (state, tokens) = test_state();
    let app = app(state);

    // A token whose client has since vanished from the credential
    // table: the bearer layer accepts it, the signature layer must 403.
    let token = tokens.issue("unknown").expect("issue").token;
    let resp = app
        .oneshot(signed_request(
            "GET",
            "/api/games",
            b"",
            "unknown",
            "whatever",
            Some(&token),
        ))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn api_rejects_mismatched_signature_client() {
    let (state, tokens) = test_state();
    let app = app(state);

    let token = tokens.issue("cli").expect("issue").token;
    // Signed as a different client than the token carries.
    let resp = app
        .oneshot(signed_request(
            "GET",
            "/api/games",
            b"",
            "other",
            SECRET,
            Some(&token),
        ))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_rejects_stale_timestamps() {
    let (state, tokens) = test_state();
    let app = app(state);
    let token = tokens.issue("cli").expect("issue").token;

    let timestamp = (unix_now() - 61).to_string();
    let nonce = generate_nonce();
    let signature = compute_signature(SECRET, "GET", "/api/games", b"", &timestamp, &nonce);
    let req = Request::builder()
        .method("GET")
        .uri("/api/games")
        .header("authorization", format!("Bearer {token}"))
        .header("x-client-id", "cli")
        .header("x-timestamp", &timestamp)
        .header("x-nonce", &nonce)
        .header("x-signature", &signature)
        .body(Body::empty())
        .expect("request builds");

    let resp = app.oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn docs_are_bearer_only() {
    let (state, tokens) = test_state();
    let app = app(state);

    // No token: 401.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/docs")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Bearer alone suffices — no signature headers.
    let token = tokens.issue("cli").expect("issue").token;
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/docs")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn root_and_health_are_public() {
    let (state, _) = test_state();
    let app = app(state);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["service"], "steamboard");

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["db"], "disconnected");
    assert_eq!(json["scheduler"], "running");
}

#[tokio::test]
async fn login_with_malformed_body_is_unprocessable() {
    let (state, _) = test_state();
    let app = app(state);

    let body = br#"{"not_client_id": 42}"#;
    let resp = app
        .oneshot(signed_request("POST", "/auth/login", body, "cli", SECRET, None))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn oversized_tag_batch_is_unprocessable() {
    let (state, tokens) = test_state();
    let app = app(state);
    let token = tokens.issue("cli").expect("issue").token;

    let appids: Vec<i64> = (1..=101).collect();
    let body = serde_json::to_vec(&serde_json::json!({ "appids": appids })).expect("json");
    let resp = app
        .oneshot(signed_request(
            "POST",
            "/api/games/tags/batch",
            &body,
            "cli",
            SECRET,
            Some(&token),
        ))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
