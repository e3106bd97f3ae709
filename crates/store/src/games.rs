//! Game metadata and tag operations.

use std::collections::HashMap;

use sb_steam::types::GameDetails;

use crate::rows::{GameRecord, GameTags};
use crate::{Result, Store};

const GAME_SELECT: &str = r#"
    SELECT
        g.appid, g.name, g.detailed_description, g.header_image,
        g.background_image, g.release_date, g.price, g.is_free,
        COALESCE(ARRAY_AGG(DISTINCT gg.genre)
                 FILTER (WHERE gg.genre IS NOT NULL), '{}') AS genres,
        COALESCE(ARRAY_AGG(DISTINCT gc.category)
                 FILTER (WHERE gc.category IS NOT NULL), '{}') AS categories
    FROM games g
    LEFT JOIN game_genres gg ON g.appid = gg.appid
    LEFT JOIN game_categories gc ON g.appid = gc.appid
"#;

impl Store {
    /// Insert or replace game metadata. Scalar fields are always
    /// replaced on conflict. With `replace` the genre/category sets are
    /// rewritten wholesale; otherwise new tuples are unioned in and
    /// duplicates ignored.
    pub async fn upsert_metadata(&self, details: &GameDetails, replace: bool) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO games (
                appid, name, detailed_description, header_image,
                background_image, release_date, price, is_free
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (appid) DO UPDATE SET
                name = EXCLUDED.name,
                detailed_description = EXCLUDED.detailed_description,
                header_image = EXCLUDED.header_image,
                background_image = EXCLUDED.background_image,
                release_date = EXCLUDED.release_date,
                price = EXCLUDED.price,
                is_free = EXCLUDED.is_free
            "#,
        )
        .bind(details.appid)
        .bind(&details.name)
        .bind(&details.detailed_description)
        .bind(&details.header_image)
        .bind(&details.background_image)
        .bind(&details.release_date)
        .bind(details.price)
        .bind(details.is_free)
        .execute(&mut *tx)
        .await?;

        if replace {
            sqlx::query("DELETE FROM game_genres WHERE appid = $1")
                .bind(details.appid)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM game_categories WHERE appid = $1")
                .bind(details.appid)
                .execute(&mut *tx)
                .await?;
        }

        if !details.genres.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO game_genres (appid, genre)
                SELECT $1, UNNEST($2::VARCHAR[])
                ON CONFLICT (appid, genre) DO NOTHING
                "#,
            )
            .bind(details.appid)
            .bind(&details.genres)
            .execute(&mut *tx)
            .await?;
        }
        if !details.categories.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO game_categories (appid, category)
                SELECT $1, UNNEST($2::VARCHAR[])
                ON CONFLICT (appid, category) DO NOTHING
                "#,
            )
            .bind(details.appid)
            .bind(&details.categories)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_game(&self, appid: i32) -> Result<Option<GameRecord>> {
        let sql = format!("{GAME_SELECT} WHERE g.appid = $1 GROUP BY g.appid");
        let row = sqlx::query_as(&sql)
            .bind(appid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_all_games(&self) -> Result<Vec<GameRecord>> {
        let sql = format!("{GAME_SELECT} GROUP BY g.appid ORDER BY g.appid");
        let rows = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn games_by_genre(&self, genre: &str) -> Result<Vec<GameRecord>> {
        let sql = format!(
            "{GAME_SELECT} WHERE g.appid IN
                 (SELECT appid FROM game_genres WHERE genre = $1)
             GROUP BY g.appid ORDER BY g.appid"
        );
        let rows = sqlx::query_as(&sql)
            .bind(genre)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn games_by_category(&self, category: &str) -> Result<Vec<GameRecord>> {
        let sql = format!(
            "{GAME_SELECT} WHERE g.appid IN
                 (SELECT appid FROM game_categories WHERE category = $1)
             GROUP BY g.appid ORDER BY g.appid"
        );
        let rows = sqlx::query_as(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_genres(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT genre FROM game_genres ORDER BY genre")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(g,)| g).collect())
    }

    pub async fn list_categories(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT category FROM game_categories ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    /// Tag sets for a batch of ids. Ids without any stored tags map to
    /// empty sets.
    pub async fn tags_batch(&self, appids: &[i32]) -> Result<HashMap<i32, GameTags>> {
        let mut out: HashMap<i32, GameTags> = appids
            .iter()
            .map(|appid| (*appid, GameTags::default()))
            .collect();

        let genres: Vec<(i32, String)> = sqlx::query_as(
            "SELECT appid, genre FROM game_genres WHERE appid = ANY($1) ORDER BY genre",
        )
        .bind(appids)
        .fetch_all(&self.pool)
        .await?;
        for (appid, genre) in genres {
            if let Some(tags) = out.get_mut(&appid) {
                tags.genres.push(genre);
            }
        }

        let categories: Vec<(i32, String)> = sqlx::query_as(
            "SELECT appid, category FROM game_categories WHERE appid = ANY($1) ORDER BY category",
        )
        .bind(appids)
        .fetch_all(&self.pool)
        .await?;
        for (appid, category) in categories {
            if let Some(tags) = out.get_mut(&appid) {
                tags.categories.push(category);
            }
        }

        Ok(out)
    }
}
