use super::{env_parse, env_str};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Database
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// PostgreSQL connection and pool settings. All tables live in
/// `schema` so parallel deployments and test runs can isolate state.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub schema: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: String::new(),
            database: "postgres".into(),
            schema: "steamboard".into(),
            pool_min: 10,
            pool_max: 20,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_str("PGHOST", "localhost"),
            port: env_parse("PGPORT", 5432),
            user: env_str("PGUSER", "postgres"),
            password: env_str("PGPASSWORD", ""),
            database: env_str("PGDATABASE", "postgres"),
            schema: env_str("SB_DB_SCHEMA", "steamboard"),
            pool_min: env_parse("SB_DB_POOL_MIN", 10),
            pool_max: env_parse("SB_DB_POOL_MAX", 20),
        }
    }
}
