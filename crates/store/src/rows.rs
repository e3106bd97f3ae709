//! Row types returned by store reads. Serialized as-is by the API.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// One watchlist entry.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct WatchedGame {
    pub appid: i32,
    pub name: String,
    pub last_count: i32,
}

/// A raw player-count sample.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct RawSample {
    pub appid: i32,
    pub ts_unix: i64,
    pub count: i32,
}

/// One point of a charted series (5-minute or hourly).
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct SeriesPoint {
    pub ts_unix: i64,
    pub avg_players: f64,
    pub max_players: i32,
}

/// One point of the daily series.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct DailyPoint {
    pub date_ymd: String,
    pub avg_players: f64,
    pub max_players: i32,
}

/// A full hourly rollup row, used by rollup verification reads.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct HourlyBucket {
    pub appid: i32,
    pub hour_unix: i64,
    pub avg_players: f64,
    pub min_players: i32,
    pub max_players: i32,
    pub p95_players: i32,
    pub samples: i32,
}

/// A full daily rollup row.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct DailyBucket {
    pub appid: i32,
    pub date_ymd: String,
    pub avg_players: f64,
    pub min_players: i32,
    pub max_players: i32,
    pub p95_players: i32,
    pub samples: i32,
}

/// Game metadata with aggregated tag arrays.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GameRecord {
    pub appid: i32,
    pub name: String,
    pub detailed_description: String,
    pub header_image: String,
    pub background_image: String,
    pub release_date: Option<String>,
    pub price: Decimal,
    pub is_free: bool,
    pub genres: Vec<String>,
    pub categories: Vec<String>,
}

/// Genre/category tag sets for one game.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GameTags {
    pub genres: Vec<String>,
    pub categories: Vec<String>,
}
