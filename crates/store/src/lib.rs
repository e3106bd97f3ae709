//! PostgreSQL persistence for Steamboard.
//!
//! All tables live in one configurable schema; every pooled connection
//! pins its `search_path` there so parallel deployments and test runs
//! isolate cleanly. The pool releases connections on every exit path;
//! no operation here retries — transient errors bubble to the caller.

mod counts;
mod games;
mod rollup;
mod rows;
mod schema;
mod watchlist;

pub use rollup::p95;
pub use rows::*;

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool};

use sb_domain::config::DatabaseConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid schema name: {0:?}")]
    InvalidSchema(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Handle over the connection pool. Cheap to clone; shared by the API
/// handlers and the collection jobs.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
    schema: String,
}

impl Store {
    /// Connect eagerly and verify the server is reachable.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self> {
        let options = Self::connect_options(cfg)?;
        let pool = Self::pool_options(cfg)?.connect_with(options).await?;
        tracing::info!(
            schema = %cfg.schema,
            min = cfg.pool_min,
            max = cfg.pool_max,
            "database pool ready"
        );
        Ok(Self {
            pool,
            schema: cfg.schema.clone(),
        })
    }

    /// Build the pool without opening a connection. The first query
    /// connects on demand.
    pub fn connect_lazy(cfg: &DatabaseConfig) -> Result<Self> {
        let options = Self::connect_options(cfg)?;
        let pool = Self::pool_options(cfg)?.connect_lazy_with(options);
        Ok(Self {
            pool,
            schema: cfg.schema.clone(),
        })
    }

    /// Connect from a URL, keeping the schema pinning. Used by tests.
    pub async fn connect_url(url: &str, schema: &str, max_connections: u32) -> Result<Self> {
        if !is_valid_schema(schema) {
            return Err(StoreError::InvalidSchema(schema.to_owned()));
        }
        let options = PgConnectOptions::from_str(url)?;
        let search_path = search_path_sql(schema);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .after_connect(move |conn, _meta| {
                let sql = search_path.clone();
                Box::pin(async move {
                    conn.execute(sql.as_str()).await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;
        Ok(Self {
            pool,
            schema: schema.to_owned(),
        })
    }

    fn connect_options(cfg: &DatabaseConfig) -> Result<PgConnectOptions> {
        if !is_valid_schema(&cfg.schema) {
            return Err(StoreError::InvalidSchema(cfg.schema.clone()));
        }
        Ok(PgConnectOptions::new()
            .host(&cfg.host)
            .port(cfg.port)
            .username(&cfg.user)
            .password(&cfg.password)
            .database(&cfg.database))
    }

    fn pool_options(cfg: &DatabaseConfig) -> Result<PgPoolOptions> {
        let search_path = search_path_sql(&cfg.schema);
        Ok(PgPoolOptions::new()
            .min_connections(cfg.pool_min)
            .max_connections(cfg.pool_max)
            .acquire_timeout(Duration::from_secs(10))
            .after_connect(move |conn, _meta| {
                let sql = search_path.clone();
                Box::pin(async move {
                    conn.execute(sql.as_str()).await?;
                    Ok(())
                })
            }))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Create the schema and all tables if absent. Idempotent. Fatal
    /// at startup when it fails.
    pub async fn init_schema(&self) -> Result<()> {
        self.pool
            .execute(format!(r#"CREATE SCHEMA IF NOT EXISTS "{}""#, self.schema).as_str())
            .await?;
        sqlx::raw_sql(schema::SCHEMA_SQL).execute(&self.pool).await?;
        tracing::info!(schema = %self.schema, "schema initialized");
        Ok(())
    }

    /// Liveness probe used by `/health`.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn search_path_sql(schema: &str) -> String {
    format!(r#"SET search_path TO "{schema}", public"#)
}

/// Schema names are spliced into SQL, so only plain identifiers pass.
fn is_valid_schema(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
