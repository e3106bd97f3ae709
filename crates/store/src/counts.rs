//! Raw sample writes and series reads.

use crate::rows::{DailyPoint, RawSample, SeriesPoint};
use crate::{Result, Store};

impl Store {
    /// Record one raw sample. Duplicate `(appid, ts)` pairs are a
    /// silent no-op, which makes re-collection idempotent.
    pub async fn insert_raw(&self, appid: i32, ts_unix: i64, count: i32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO player_counts_raw (appid, ts_unix, count)
            VALUES ($1, $2, $3)
            ON CONFLICT (appid, ts_unix) DO NOTHING
            "#,
        )
        .bind(appid)
        .bind(ts_unix)
        .bind(count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent raw samples for one app, newest first.
    pub async fn raw_history(&self, appid: i32, limit: i64) -> Result<Vec<RawSample>> {
        let rows = sqlx::query_as(
            r#"
            SELECT appid, ts_unix, count
            FROM player_counts_raw
            WHERE appid = $1
            ORDER BY ts_unix DESC
            LIMIT $2
            "#,
        )
        .bind(appid)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Aggregate raw samples into 5-minute buckets on the fly.
    ///
    /// Buckets are aligned to the query window: sample `ts` lands in
    /// bucket `⌊(ts − since)/300⌋`, labelled on the 300-second grid of
    /// the bucket containing `since`. A window therefore always starts
    /// with a full bucket.
    pub async fn get_series_5min(
        &self,
        appid: i32,
        since_ts: i64,
        until_ts: i64,
    ) -> Result<Vec<SeriesPoint>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                ($2::BIGINT / 300) * 300 + ((ts_unix - $2::BIGINT) / 300) * 300 AS ts_unix,
                AVG(count)::FLOAT8 AS avg_players,
                MAX(count) AS max_players
            FROM player_counts_raw
            WHERE appid = $1 AND ts_unix BETWEEN $2 AND $3
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(appid)
        .bind(since_ts)
        .bind(until_ts)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Hourly bucket reads for charting.
    pub async fn get_series_hourly(
        &self,
        appid: i32,
        since_ts: i64,
        until_ts: i64,
    ) -> Result<Vec<SeriesPoint>> {
        let rows = sqlx::query_as(
            r#"
            SELECT hour_unix AS ts_unix, avg_players, max_players
            FROM player_counts_hourly
            WHERE appid = $1 AND hour_unix BETWEEN $2 AND $3
            ORDER BY hour_unix
            "#,
        )
        .bind(appid)
        .bind(since_ts)
        .bind(until_ts)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Daily bucket reads, bounded by `YYYY-MM-DD` date strings.
    pub async fn get_series_daily(
        &self,
        appid: i32,
        since_ymd: &str,
        until_ymd: &str,
    ) -> Result<Vec<DailyPoint>> {
        let rows = sqlx::query_as(
            r#"
            SELECT date_ymd, avg_players, max_players
            FROM player_counts_daily
            WHERE appid = $1 AND date_ymd BETWEEN $2 AND $3
            ORDER BY date_ymd
            "#,
        )
        .bind(appid)
        .bind(since_ymd)
        .bind(until_ymd)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
