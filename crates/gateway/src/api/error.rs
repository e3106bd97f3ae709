//! API error responses: JSON `{"detail": "..."}` with conventional
//! status codes. Internal detail never leaks to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use sb_auth::AuthError;
use sb_store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    /// 400 — out-of-range or malformed input values.
    Validation(String),
    /// 401 — missing/invalid token or failed signature.
    Unauthorized(String),
    /// 403 — authenticated shape but unknown client.
    Forbidden(String),
    /// 404
    NotFound(String),
    /// 422 — body parsed but violates shape constraints.
    Unprocessable(String),
    /// 500 — logged in full, reported tersely.
    Internal,
    /// 503 — upstream transient failure.
    Upstream(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Validation(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::Unprocessable(m)
            | ApiError::Upstream(m) => m.clone(),
            ApiError::Internal => "internal server error".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "detail": self.detail() })),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "store error in request handler");
        ApiError::Internal
    }
}

impl From<sb_domain::Error> for ApiError {
    fn from(e: sb_domain::Error) -> Self {
        use sb_domain::Error;
        match e {
            Error::Http(_) | Error::Timeout(_) | Error::Upstream { .. } => {
                tracing::warn!(error = %e, "upstream failure in request handler");
                ApiError::Upstream("upstream service unavailable".into())
            }
            other => {
                tracing::error!(error = %other, "internal error in request handler");
                ApiError::Internal
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::UnknownClient => ApiError::Forbidden("unknown client".into()),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}
