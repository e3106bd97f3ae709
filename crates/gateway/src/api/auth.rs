//! `POST /auth/login` — signed request, no bearer.
//!
//! Login performs its own signature check (the route is exempt from
//! the gate middleware) and mints a bearer token for the verified
//! client.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::response::Json;
use serde::Deserialize;

use sb_auth::SignedRequest;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    client_id: String,
}

pub async fn login(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let signed = SignedRequest {
        method: "POST",
        path: uri.path(),
        body: &body,
        client_id: header("x-client-id"),
        timestamp: header("x-timestamp"),
        nonce: header("x-nonce"),
        signature: header("x-signature"),
    };
    let verified = state.verifier.verify(&signed)?;

    let parsed: LoginRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::Unprocessable("body must be {\"client_id\": ...}".into()))?;
    if parsed.client_id != verified {
        return Err(ApiError::Unauthorized(
            "body client_id does not match signature".into(),
        ));
    }

    let issued = state.tokens.issue(&verified)?;
    tracing::info!(client_id = %verified, "login succeeded");
    Ok(Json(serde_json::json!({
        "access_token": issued.token,
        "token_type": "bearer",
        "expires_in": issued.expires_in,
    })))
}
