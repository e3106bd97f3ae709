//! Rollups and retention.
//!
//! Grouping and p95 happen in application code rather than SQL: the
//! percentile definition is nearest-rank over the sorted bucket, which
//! `PERCENTILE_CONT` would interpolate away. Rollups are idempotent —
//! re-running a window upserts identical rows.

use std::collections::BTreeMap;

use crate::{Result, Store};

pub(crate) const DEFAULT_RAW_RETENTION_DAYS: i64 = 14;
pub(crate) const DEFAULT_HOURLY_RETENTION_DAYS: i64 = 30;
pub(crate) const DEFAULT_DAILY_RETENTION_DAYS: i64 = 90;

/// Nearest-rank 95th percentile: sort ascending, take the element at
/// `max(0, ⌈0.95·N⌉ − 1)`. Ties keep their post-sort position.
pub fn p95(values: &[i32]) -> i32 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    // Integer ceil(0.95 * n) avoids float rounding at exact multiples.
    let rank = (95 * sorted.len()).div_ceil(100);
    sorted[rank.saturating_sub(1)]
}

fn hour_bucket(ts_unix: i64) -> i64 {
    (ts_unix / 3600) * 3600
}

/// UTC calendar date for an epoch second.
fn date_ymd(ts_unix: i64) -> String {
    chrono::DateTime::from_timestamp(ts_unix, 0)
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_owned())
}

struct BucketStats {
    avg: f64,
    min: i32,
    max: i32,
    p95: i32,
    samples: i32,
}

fn bucket_stats(values: &[i32]) -> BucketStats {
    let samples = values.len() as i32;
    let sum: i64 = values.iter().map(|v| *v as i64).sum();
    BucketStats {
        avg: sum as f64 / values.len() as f64,
        min: values.iter().copied().min().unwrap_or(0),
        max: values.iter().copied().max().unwrap_or(0),
        p95: p95(values),
        samples,
    }
}

impl Store {
    async fn fetch_raw_window(
        &self,
        since_ts: Option<i64>,
        until_ts: Option<i64>,
        appids: Option<&[i32]>,
    ) -> Result<Vec<(i32, i64, i32)>> {
        let rows: Vec<(i32, i64, i32)> = sqlx::query_as(
            r#"
            SELECT appid, ts_unix, count
            FROM player_counts_raw
            WHERE ($1::BIGINT IS NULL OR ts_unix >= $1)
              AND ($2::BIGINT IS NULL OR ts_unix <= $2)
              AND ($3::INT[] IS NULL OR appid = ANY($3))
            ORDER BY appid, ts_unix
            "#,
        )
        .bind(since_ts)
        .bind(until_ts)
        .bind(appids.map(|ids| ids.to_vec()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Roll raw samples in the window up into hourly buckets. Returns
    /// the number of upserted buckets. Safe to re-run on overlapping
    /// windows.
    pub async fn rollup_hourly(
        &self,
        since_ts: Option<i64>,
        until_ts: Option<i64>,
        appids: Option<&[i32]>,
    ) -> Result<u64> {
        let raw = self.fetch_raw_window(since_ts, until_ts, appids).await?;

        let mut buckets: BTreeMap<(i32, i64), Vec<i32>> = BTreeMap::new();
        for (appid, ts, count) in raw {
            buckets.entry((appid, hour_bucket(ts))).or_default().push(count);
        }

        let mut upserts = 0u64;
        for ((appid, hour_unix), values) in &buckets {
            let stats = bucket_stats(values);
            sqlx::query(
                r#"
                INSERT INTO player_counts_hourly
                    (appid, hour_unix, avg_players, min_players, max_players, p95_players, samples)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (appid, hour_unix) DO UPDATE SET
                    avg_players = EXCLUDED.avg_players,
                    min_players = EXCLUDED.min_players,
                    max_players = EXCLUDED.max_players,
                    p95_players = EXCLUDED.p95_players,
                    samples = EXCLUDED.samples
                "#,
            )
            .bind(appid)
            .bind(hour_unix)
            .bind(stats.avg)
            .bind(stats.min)
            .bind(stats.max)
            .bind(stats.p95)
            .bind(stats.samples)
            .execute(&self.pool)
            .await?;
            upserts += 1;
        }
        Ok(upserts)
    }

    /// Roll raw samples up into UTC-daily buckets. Returns the number
    /// of upserted buckets.
    pub async fn rollup_daily(
        &self,
        since_ts: Option<i64>,
        until_ts: Option<i64>,
        appids: Option<&[i32]>,
    ) -> Result<u64> {
        let raw = self.fetch_raw_window(since_ts, until_ts, appids).await?;

        let mut buckets: BTreeMap<(i32, String), Vec<i32>> = BTreeMap::new();
        for (appid, ts, count) in raw {
            buckets.entry((appid, date_ymd(ts))).or_default().push(count);
        }

        let mut upserts = 0u64;
        for ((appid, ymd), values) in &buckets {
            let stats = bucket_stats(values);
            sqlx::query(
                r#"
                INSERT INTO player_counts_daily
                    (appid, date_ymd, avg_players, min_players, max_players, p95_players, samples)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (appid, date_ymd) DO UPDATE SET
                    avg_players = EXCLUDED.avg_players,
                    min_players = EXCLUDED.min_players,
                    max_players = EXCLUDED.max_players,
                    p95_players = EXCLUDED.p95_players,
                    samples = EXCLUDED.samples
                "#,
            )
            .bind(appid)
            .bind(ymd)
            .bind(stats.avg)
            .bind(stats.min)
            .bind(stats.max)
            .bind(stats.p95)
            .bind(stats.samples)
            .execute(&self.pool)
            .await?;
            upserts += 1;
        }
        Ok(upserts)
    }

    // ── retention ────────────────────────────────────────────────────

    /// Delete raw samples older than `days` relative to `now_ts`.
    /// `now_ts` must be wall-clock Unix seconds — never a monotonic
    /// reading, which is not comparable against stored timestamps.
    pub async fn purge_raw(&self, now_ts: i64, days: i64) -> Result<u64> {
        let cutoff = now_ts - days * 86_400;
        let res = sqlx::query("DELETE FROM player_counts_raw WHERE ts_unix < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn purge_hourly(&self, now_ts: i64, days: i64) -> Result<u64> {
        let cutoff = now_ts - days * 86_400;
        let res = sqlx::query("DELETE FROM player_counts_hourly WHERE hour_unix < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn purge_daily(&self, now_ts: i64, days: i64) -> Result<u64> {
        let cutoff_ymd = date_ymd(now_ts - days * 86_400);
        let res = sqlx::query("DELETE FROM player_counts_daily WHERE date_ymd < $1")
            .bind(cutoff_ymd)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    /// Apply the default retention windows in one sweep.
    pub async fn purge(&self, now_ts: i64) -> Result<()> {
        self.purge_raw(now_ts, DEFAULT_RAW_RETENTION_DAYS).await?;
        self.purge_hourly(now_ts, DEFAULT_HOURLY_RETENTION_DAYS)
            .await?;
        self.purge_daily(now_ts, DEFAULT_DAILY_RETENTION_DAYS)
            .await?;
        Ok(())
    }
}
