//! Postgres-backed integration tests.
//!
//! These run against the database named by `SB_TEST_DATABASE_URL`
//! (e.g. `postgres://postgres@localhost/postgres`) and skip silently
//! when it is unset. Each test works in its own schema and drops it on
//! the way out, so parallel runs do not interfere.

use sb_steam::types::GameDetails;
use sb_store::Store;

async fn test_store(tag: &str) -> Option<Store> {
    let url = std::env::var("SB_TEST_DATABASE_URL").ok()?;
    let schema = format!("sb_test_{}_{}", std::process::id(), tag);
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

fn details(appid: i32, name: &str, genres: &[&str], categories: &[&str]) -> GameDetails {
    GameDetails {
        appid,
        name: name.to_owned(),
        is_free: false,
        price: rust_decimal::Decimal::new(4999, 2),
        detailed_description: "A game".to_owned(),
        header_image: "https://cdn/h.jpg".to_owned(),
        background_image: "https://cdn/b.jpg".to_owned(),
        coming_soon: false,
        release_date: Some("21 Aug, 2012".to_owned()),
        genres: genres.iter().map(|s| (*s).to_owned()).collect(),
        categories: categories.iter().map(|s| (*s).to_owned()).collect(),
    }
}

#[tokio::test]
async fn watchlist_upsert_preserves_name_and_orders_by_count() {
    let Some(store) = test_store("watchlist").await else {
        return;
    };

    store.upsert_watched(730, "G", 100).await.expect("insert");
    store.upsert_watched(570, "Dota 2", 900).await.expect("insert");
    // Conflict updates last_count but not the stored name.
    store
        .upsert_watched(730, "renamed", 500)
        .await
        .expect("update");

    let watched = store.list_watched().await.expect("list");
    assert_eq!(watched.len(), 2);
    assert_eq!(watched[0].appid, 570, "ordered by last_count desc");
    assert_eq!(watched[1].appid, 730);
    assert_eq!(watched[1].name, "G", "name unchanged on conflict");
    assert_eq!(watched[1].last_count, 500);

    teardown(store).await;
}

#[tokio::test]
async fn raw_inserts_are_idempotent_per_timestamp() {
    let Some(store) = test_store("rawdup").await else {
        return;
    };

    store.upsert_watched(730, "G", 0).await.expect("watch");
    store.insert_raw(730, 1000, 100).await.expect("insert");
    store.insert_raw(730, 1000, 999).await.expect("duplicate ignored");

    let rows = store.raw_history(730, 10).await.expect("history");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].count, 100, "first write wins");

    teardown(store).await;
}

#[tokio::test]
async fn five_minute_series_buckets_align_to_window_start() {
    let Some(store) = test_store("series5").await else {
        return;
    };

    store.upsert_watched(730, "G", 0).await.expect("watch");
    for (ts, count) in [(1000, 100), (1200, 200), (1299, 300)] {
        store.insert_raw(730, ts, count).await.expect("insert");
    }

    let series = store.get_series_5min(730, 1000, 1500).await.expect("series");
    assert_eq!(series.len(), 1, "all three samples share the first bucket");
    assert_eq!(series[0].ts_unix, 900);
    assert_eq!(series[0].avg_players, 200.0);
    assert_eq!(series[0].max_players, 300);

    // Round-trip law: a single sample at t lands at t - (t mod 300).
    store.insert_raw(730, 7513, 42).await.expect("insert");
    let single = store.get_series_5min(730, 7513, 7513).await.expect("series");
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].ts_unix, 7513 - (7513 % 300));
    assert_eq!(single[0].avg_players, 42.0);

    teardown(store).await;
}

#[tokio::test]
async fn hourly_rollup_is_idempotent() {
    let Some(store) = test_store("rollup_h").await else {
        return;
    };

    store.upsert_watched(730, "G", 0).await.expect("watch");
    for (ts, count) in [(1000, 100), (1200, 200), (1299, 300), (2500, 400)] {
        store.insert_raw(730, ts, count).await.expect("insert");
    }

    let first = store.rollup_hourly(Some(0), None, None).await.expect("rollup");
    assert_eq!(first, 1);
    let second = store.rollup_hourly(Some(0), None, None).await.expect("rollup");
    assert_eq!(second, 1);

    let rows: Vec<sb_store::HourlyBucket> =
        sqlx::query_as("SELECT * FROM player_counts_hourly ORDER BY appid, hour_unix")
            .fetch_all(store.pool())
            .await
            .expect("read buckets");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.hour_unix, 0);
    assert_eq!(row.avg_players, 250.0);
    assert_eq!(row.min_players, 100);
    assert_eq!(row.max_players, 400);
    assert_eq!(row.p95_players, 400);
    assert_eq!(row.samples, 4);

    // Bucket invariant holds.
    assert!(row.min_players as f64 <= row.avg_players);
    assert!(row.avg_players <= row.max_players as f64);
    assert!(row.min_players <= row.p95_players && row.p95_players <= row.max_players);

    let series = store.get_series_hourly(730, 0, 3600).await.expect("series");
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].avg_players, 250.0);

    teardown(store).await;
}

#[tokio::test]
async fn daily_rollup_groups_by_utc_date() {
    let Some(store) = test_store("rollup_d").await else {
        return;
    };

    store.upsert_watched(730, "G", 0).await.expect("watch");
    // Two samples on 1970-01-01, one on 1970-01-02.
    store.insert_raw(730, 1000, 100).await.expect("insert");
    store.insert_raw(730, 2000, 300).await.expect("insert");
    store.insert_raw(730, 86_400 + 10, 500).await.expect("insert");

    let upserts = store.rollup_daily(None, None, None).await.expect("rollup");
    assert_eq!(upserts, 2);

    let series = store
        .get_series_daily(730, "1970-01-01", "1970-01-02")
        .await
        .expect("series");
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date_ymd, "1970-01-01");
    assert_eq!(series[0].avg_players, 200.0);
    assert_eq!(series[1].date_ymd, "1970-01-02");
    assert_eq!(series[1].max_players, 500);

    teardown(store).await;
}

#[tokio::test]
async fn purge_enforces_retention_windows() {
    let Some(store) = test_store("purge").await else {
        return;
    };

    let now = 10 * 86_400;
    store.upsert_watched(730, "G", 0).await.expect("watch");
    store.insert_raw(730, 0, 1).await.expect("old sample");
    store.insert_raw(730, 9 * 86_400, 2).await.expect("new sample");
    store.rollup_hourly(None, None, None).await.expect("rollup");
    store.rollup_daily(None, None, None).await.expect("rollup");

    // Default windows: with now at day 10 nothing is old enough yet.
    store.purge(now).await.expect("purge");
    assert_eq!(store.raw_history(730, 10).await.expect("raw").len(), 2);

    // Shrink the raw window to 5 days: the day-0 sample goes.
    let deleted = store.purge_raw(now, 5).await.expect("purge raw");
    assert_eq!(deleted, 1);
    let remaining = store.raw_history(730, 10).await.expect("raw");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].ts_unix, 9 * 86_400);

    // Hourly and daily buckets for day 0 fall to their own windows.
    let hourly_deleted = store.purge_hourly(now, 5).await.expect("purge hourly");
    assert_eq!(hourly_deleted, 1);
    let daily_deleted = store.purge_daily(now, 5).await.expect("purge daily");
    assert_eq!(daily_deleted, 1);

    teardown(store).await;
}

#[tokio::test]
async fn metadata_upsert_and_tag_replacement() {
    let Some(store) = test_store("metadata").await else {
        return;
    };

    store.upsert_watched(730, "G", 0).await.expect("watch");
    let d = details(730, "Counter-Strike 2", &["Action", "FPS"], &["Multi-player"]);
    store.upsert_metadata(&d, true).await.expect("upsert");

    let game = store.get_game(730).await.expect("get").expect("present");
    assert_eq!(game.name, "Counter-Strike 2");
    assert_eq!(game.price, rust_decimal::Decimal::new(4999, 2));
    assert_eq!(game.genres, vec!["Action", "FPS"]);
    assert_eq!(game.categories, vec!["Multi-player"]);

    // Union insert keeps existing tuples and ignores duplicates.
    let d2 = details(730, "Counter-Strike 2", &["Action", "Esports"], &[]);
    store.upsert_metadata(&d2, false).await.expect("union");
    let game = store.get_game(730).await.expect("get").expect("present");
    assert_eq!(game.genres, vec!["Action", "Esports", "FPS"]);

    // Replace rewrites the sets wholesale.
    let d3 = details(730, "Counter-Strike 2", &["Shooter"], &["PvP"]);
    store.upsert_metadata(&d3, true).await.expect("replace");
    let game = store.get_game(730).await.expect("get").expect("present");
    assert_eq!(game.genres, vec!["Shooter"]);
    assert_eq!(game.categories, vec!["PvP"]);

    assert!(store.get_game(999_999).await.expect("get").is_none());

    teardown(store).await;
}

#[tokio::test]
async fn distinct_tags_and_batch_lookup() {
    let Some(store) = test_store("tags").await else {
        return;
    };

    store.upsert_watched(730, "CS2", 0).await.expect("watch");
    store.upsert_watched(570, "Dota 2", 0).await.expect("watch");
    store
        .upsert_metadata(&details(730, "CS2", &["Action"], &["Multi-player"]), true)
        .await
        .expect("upsert");
    store
        .upsert_metadata(&details(570, "Dota 2", &["Action", "Strategy"], &["Co-op"]), true)
        .await
        .expect("upsert");

    assert_eq!(store.list_genres().await.expect("genres"), vec!["Action", "Strategy"]);
    assert_eq!(
        store.list_categories().await.expect("categories"),
        vec!["Co-op", "Multi-player"]
    );

    let tags = store.tags_batch(&[730, 570, 42]).await.expect("batch");
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[&570].genres, vec!["Action", "Strategy"]);
    assert!(tags[&42].genres.is_empty(), "unknown id maps to empty sets");

    let by_genre = store.games_by_genre("Strategy").await.expect("filter");
    assert_eq!(by_genre.len(), 1);
    assert_eq!(by_genre[0].appid, 570);

    let by_category = store.games_by_category("Multi-player").await.expect("filter");
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].appid, 730);

    teardown(store).await;
}

#[tokio::test]
async fn removing_a_watched_game_cascades() {
    let Some(store) = test_store("cascade").await else {
        return;
    };

    store.upsert_watched(730, "G", 0).await.expect("watch");
    store.insert_raw(730, 1000, 100).await.expect("raw");
    store
        .upsert_metadata(&details(730, "G", &["Action"], &["PvP"]), true)
        .await
        .expect("metadata");
    store.rollup_hourly(None, None, None).await.expect("rollup");
    store.rollup_daily(None, None, None).await.expect("rollup");

    store.remove_watched(730).await.expect("remove");

    assert!(store.list_watched().await.expect("list").is_empty());
    assert!(store.raw_history(730, 10).await.expect("raw").is_empty());
    assert!(store.get_game(730).await.expect("get").is_none());
    assert!(store
        .get_series_hourly(730, 0, i64::MAX)
        .await
        .expect("hourly")
        .is_empty());
    assert!(store
        .get_series_daily(730, "1970-01-01", "2100-01-01")
        .await
        .expect("daily")
        .is_empty());
    let genres: Vec<(String,)> = sqlx::query_as("SELECT genre FROM game_genres")
        .fetch_all(store.pool())
        .await
        .expect("read");
    assert!(genres.is_empty());

    teardown(store).await;
}
