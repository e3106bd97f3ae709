//! `POST /api/player-history/compare` — 5-minute series for a batch of
//! watched games over a trailing window, for side-by-side charting.

use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;

use super::error::ApiError;
use super::validate::validate_appid_list;
use crate::state::AppState;

const MAX_COMPARE_DAYS: f64 = 14.0;

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    appids: Vec<i64>,
    #[serde(default = "d_days")]
    days: f64,
}

fn d_days() -> f64 {
    7.0
}

pub async fn compare(
    State(state): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let appids = validate_appid_list(&req.appids)?;
    if !(req.days > 0.0 && req.days <= MAX_COMPARE_DAYS) {
        return Err(ApiError::Validation(format!(
            "days must be in (0, {MAX_COMPARE_DAYS}]"
        )));
    }

    let until = sb_auth::unix_now();
    let since = until - (req.days * 86_400.0) as i64;

    let mut series = serde_json::Map::new();
    for appid in appids {
        let points = state.store.get_series_5min(appid, since, until).await?;
        series.insert(appid.to_string(), serde_json::json!(points));
    }

    Ok(Json(serde_json::json!({
        "since_ts": since,
        "until_ts": until,
        "series": series,
    })))
}
