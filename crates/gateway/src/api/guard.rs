//! Request gate: bearer-token middleware, HMAC signature middleware,
//! and the rate-limit key extractor.
//!
//! The signature middleware buffers the body exactly once and hands the
//! same buffer to both the verifier and the route handler — the stream
//! is never read twice.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_governor::key_extractor::KeyExtractor;
use tower_governor::GovernorError;

use sb_auth::{AuthError, Claims, SignedRequest, TokenIssuer};

use super::error::ApiError;
use crate::state::AppState;

/// Cap on buffered request bodies. Batch requests are small JSON.
const MAX_BODY_BYTES: usize = 1 << 20;

/// The client id that passed signature verification, available to
/// handlers behind the signed gate.
#[derive(Debug, Clone)]
pub struct VerifiedClient(pub String);

/// Pull the bearer token out of an `Authorization` header.
fn bearer_token<T>(req: &Request<T>) -> Option<&str> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Bearer middleware
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&req) else {
        return ApiError::Unauthorized("missing bearer token".into()).into_response();
    };
    match state.tokens.verify(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "bearer verification failed");
            ApiError::Unauthorized(e.to_string()).into_response()
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Signature middleware (runs after the bearer check)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

enum GateOutcome {
    Accepted(String),
    MismatchedClient,
    Rejected(AuthError),
}

pub async fn require_signature(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(claims) = req.extensions().get::<Claims>().cloned() else {
        return ApiError::Unauthorized("missing bearer token".into()).into_response();
    };

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(_) => {
            return ApiError::Unprocessable("request body too large".into()).into_response()
        }
    };

    let outcome = {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
        let client_id = header("x-client-id");
        match client_id {
            Some(cid) if cid != claims.client_id => GateOutcome::MismatchedClient,
            _ => {
                let signed = SignedRequest {
                    method: parts.method.as_str(),
                    path: parts.uri.path(),
                    body: &bytes,
                    client_id,
                    timestamp: header("x-timestamp"),
                    nonce: header("x-nonce"),
                    signature: header("x-signature"),
                };
                match state.verifier.verify(&signed) {
                    Ok(verified) => GateOutcome::Accepted(verified),
                    Err(e) => GateOutcome::Rejected(e),
                }
            }
        }
    };

    match outcome {
        GateOutcome::Accepted(client_id) => {
            let mut req = Request::from_parts(parts, Body::from(bytes));
            req.extensions_mut().insert(VerifiedClient(client_id));
            next.run(req).await
        }
        GateOutcome::MismatchedClient => {
            ApiError::Unauthorized("signature client does not match token".into()).into_response()
        }
        GateOutcome::Rejected(e) => ApiError::from(e).into_response(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Rate-limit key
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Keys rate-limit buckets by `client:<id>` when a valid bearer token
/// is present, `ip:<peer>` otherwise. Stable per caller either way.
#[derive(Clone)]
pub struct CallerKeyExtractor {
    pub tokens: Arc<TokenIssuer>,
}

impl KeyExtractor for CallerKeyExtractor {
    type Key = String;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if let Some(token) = bearer_token(req) {
            if let Ok(claims) = self.tokens.verify(token) {
                return Ok(format!("client:{}", claims.client_id));
            }
        }
        req.extensions()
            .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
            .map(|ci| format!("ip:{}", ci.0.ip()))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}
