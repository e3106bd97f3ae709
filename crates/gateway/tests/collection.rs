//! Collection-engine tests against a mock upstream and a real
//! database. Skipped silently when `SB_TEST_DATABASE_URL` is unset.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;

use sb_domain::config::{JobsConfig, SteamConfig};
use sb_gateway::jobs::SampleJob;
use sb_gateway::scheduler::Job;
use sb_steam::SteamClient;
use sb_store::Store;

/// Upstream double: 730 and 440 respond with counts, 570 is down.
async fn mock_player_count(Query(params): Query<HashMap<String, String>>) -> Response {
    let appid: i32 = params
        .get("appid")
        .and_then(|s| s.parse().ok())
        .unwrap_or(-1);
    match appid {
        730 => Json(serde_json::json!({
            "response": { "player_count": 500_000, "result": 1 }
        }))
        .into_response(),
        440 => Json(serde_json::json!({
            "response": { "player_count": 400_000, "result": 1 }
        }))
        .into_response(),
        _ => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn start_mock_upstream() -> String {
    let app = Router::new().route(
        "/ISteamUserStats/GetNumberOfCurrentPlayers/v1/",
        get(mock_player_count),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn test_store(tag: &str) -> Option<Store> {
    let url = std::env::var("SB_TEST_DATABASE_URL").ok()?;
    let schema = format!("sb_gw_test_{}_{}", std::process::id(), tag);
    let store = Store::connect_url(&url, &schema, 5)
        .await
        .expect("test database reachable");
    sqlx::query(&format!(r#"DROP SCHEMA IF EXISTS "{schema}" CASCADE"#))
        .execute(store.pool())
        .await
        .expect("drop stale schema");
    store.init_schema().await.expect("init schema");
    Some(store)
}

async fn teardown(store: Store) {
    let _ = sqlx::query(&format!(
        r#"DROP SCHEMA IF EXISTS "{}" CASCADE"#,
        store.schema()
    ))
    .execute(store.pool())
    .await;
    store.close().await;
}

#[tokio::test]
async fn sample_sweep_keeps_partial_progress_on_upstream_failures() {
    let Some(store) = test_store("fanout").await else {
        return;
    };

    store.upsert_watched(730, "A", 0).await.expect("watch");
    store.upsert_watched(570, "B", 7).await.expect("watch");
    store.upsert_watched(440, "C", 0).await.expect("watch");

    let base = start_mock_upstream().await;
    let steam = SteamClient::new(&SteamConfig::default())
        .expect("client")
        .with_base_urls(&base, &base);

    let job = SampleJob::new(store.clone(), Arc::new(steam), JobsConfig::default());
    let outcome = job.run(&CancellationToken::new()).await;

    assert_eq!(outcome.succeeded, 2, "two ids sampled");
    assert_eq!(outcome.failed, 1, "the unavailable id failed");
    assert!(!outcome.timed_out);
    assert!(outcome.error.is_none());

    // Successful ids carry fresh counts; the failed one is untouched.
    let watched = store.list_watched().await.expect("list");
    let by_id: HashMap<i32, i32> = watched.iter().map(|w| (w.appid, w.last_count)).collect();
    assert_eq!(by_id[&730], 500_000);
    assert_eq!(by_id[&440], 400_000);
    assert_eq!(by_id[&570], 7, "failed fetch leaves last_count unchanged");

    // Exactly one raw row per successful id, both at the sweep's now.
    let a_rows = store.raw_history(730, 10).await.expect("raw");
    let b_rows = store.raw_history(570, 10).await.expect("raw");
    let c_rows = store.raw_history(440, 10).await.expect("raw");
    assert_eq!(a_rows.len(), 1);
    assert!(b_rows.is_empty());
    assert_eq!(c_rows.len(), 1);
    assert_eq!(a_rows[0].ts_unix, c_rows[0].ts_unix, "one now per sweep");
    assert_eq!(a_rows[0].count, 500_000);

    teardown(store).await;
}

#[tokio::test]
async fn sample_sweep_on_empty_watchlist_is_a_noop() {
    let Some(store) = test_store("empty").await else {
        return;
    };

    let base = start_mock_upstream().await;
    let steam = SteamClient::new(&SteamConfig::default())
        .expect("client")
        .with_base_urls(&base, &base);

    let job = SampleJob::new(store.clone(), Arc::new(steam), JobsConfig::default());
    let outcome = job.run(&CancellationToken::new()).await;
    assert_eq!(outcome.succeeded, 0);
    assert_eq!(outcome.failed, 0);

    teardown(store).await;
}
