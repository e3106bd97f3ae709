//! Table definitions. Names are unqualified — `search_path` pins every
//! connection to the configured schema before anything here runs.

pub(crate) const SCHEMA_SQL: &str = r#"
-- Watched games; last_count mirrors the most recent raw sample.
CREATE TABLE IF NOT EXISTS watchlist (
    appid       INTEGER PRIMARY KEY,
    name        VARCHAR(255) NOT NULL,
    last_count  INTEGER NOT NULL DEFAULT 0
);

-- Raw player-count samples, one row per (appid, second).
CREATE TABLE IF NOT EXISTS player_counts_raw (
    appid    INTEGER NOT NULL REFERENCES watchlist(appid) ON DELETE CASCADE,
    ts_unix  BIGINT NOT NULL,
    count    INTEGER NOT NULL,
    PRIMARY KEY (appid, ts_unix)
);

-- Hourly rollup buckets.
CREATE TABLE IF NOT EXISTS player_counts_hourly (
    appid        INTEGER NOT NULL,
    hour_unix    BIGINT NOT NULL,
    avg_players  DOUBLE PRECISION NOT NULL,
    min_players  INTEGER NOT NULL,
    max_players  INTEGER NOT NULL,
    p95_players  INTEGER NOT NULL,
    samples      INTEGER NOT NULL,
    PRIMARY KEY (appid, hour_unix)
);

-- Daily rollup buckets, keyed by UTC calendar date.
CREATE TABLE IF NOT EXISTS player_counts_daily (
    appid        INTEGER NOT NULL,
    date_ymd     TEXT NOT NULL,
    avg_players  DOUBLE PRECISION NOT NULL,
    min_players  INTEGER NOT NULL,
    max_players  INTEGER NOT NULL,
    p95_players  INTEGER NOT NULL,
    samples      INTEGER NOT NULL,
    PRIMARY KEY (appid, date_ymd)
);

-- Storefront metadata for watched games.
CREATE TABLE IF NOT EXISTS games (
    appid                 INTEGER PRIMARY KEY REFERENCES watchlist(appid) ON DELETE CASCADE,
    name                  VARCHAR(255) NOT NULL,
    detailed_description  TEXT NOT NULL DEFAULT '',
    header_image          VARCHAR(512) NOT NULL DEFAULT '',
    background_image      VARCHAR(512) NOT NULL DEFAULT '',
    release_date          VARCHAR(100),
    price                 NUMERIC(10, 2) NOT NULL DEFAULT 0,
    is_free               BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS game_genres (
    appid  INTEGER NOT NULL REFERENCES games(appid) ON DELETE CASCADE,
    genre  VARCHAR(100) NOT NULL,
    PRIMARY KEY (appid, genre)
);

CREATE TABLE IF NOT EXISTS game_categories (
    appid     INTEGER NOT NULL REFERENCES games(appid) ON DELETE CASCADE,
    category  VARCHAR(100) NOT NULL,
    PRIMARY KEY (appid, category)
);

CREATE INDEX IF NOT EXISTS idx_raw_appid_ts ON player_counts_raw(appid, ts_unix);
CREATE INDEX IF NOT EXISTS idx_hourly_appid ON player_counts_hourly(appid, hour_unix);
CREATE INDEX IF NOT EXISTS idx_daily_appid ON player_counts_daily(appid, date_ymd);
CREATE INDEX IF NOT EXISTS idx_genres_genre ON game_genres(genre);
CREATE INDEX IF NOT EXISTS idx_categories_category ON game_categories(category);
"#;
