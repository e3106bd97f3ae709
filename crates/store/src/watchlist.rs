//! Watchlist operations.

use crate::rows::WatchedGame;
use crate::{Result, Store};

impl Store {
    /// Insert a watched game or update its `last_count`. The stored
    /// name is set on first insert and left unchanged on conflict.
    pub async fn upsert_watched(&self, appid: i32, name: &str, last_count: i32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO watchlist (appid, name, last_count)
            VALUES ($1, $2, $3)
            ON CONFLICT (appid) DO UPDATE
            SET last_count = EXCLUDED.last_count
            "#,
        )
        .bind(appid)
        .bind(name)
        .bind(last_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove a game from the watchlist. Raw samples and metadata go
    /// with it via FK cascade; derived buckets are deleted explicitly.
    pub async fn remove_watched(&self, appid: i32) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM player_counts_hourly WHERE appid = $1")
            .bind(appid)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM player_counts_daily WHERE appid = $1")
            .bind(appid)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM watchlist WHERE appid = $1")
            .bind(appid)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// All watched games, busiest first.
    pub async fn list_watched(&self) -> Result<Vec<WatchedGame>> {
        let rows = sqlx::query_as(
            "SELECT appid, name, last_count FROM watchlist ORDER BY last_count DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn watched_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM watchlist")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
