mod auth;
mod database;
mod jobs;
mod server;
mod steam;

pub use auth::*;
pub use database::*;
pub use jobs::*;
pub use server::*;
pub use steam::*;

use std::fmt;
use std::str::FromStr;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-wide configuration, read once at startup from the
/// environment and treated as immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub steam: SteamConfig,
    pub jobs: JobsConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            auth: AuthConfig::from_env(),
            steam: SteamConfig::from_env(),
            jobs: JobsConfig::from_env(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Issues with
    /// `ConfigSeverity::Error` must abort startup.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !is_valid_schema_ident(&self.database.schema) {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "database.schema".into(),
                message: format!(
                    "{:?} is not a valid schema identifier (letters, digits, underscore)",
                    self.database.schema
                ),
            });
        }

        if self.database.pool_max < self.jobs.fanout_limit as u32 + 1 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "database.pool_max".into(),
                message: format!(
                    "pool_max ({}) must be at least fanout_limit + 1 ({})",
                    self.database.pool_max,
                    self.jobs.fanout_limit + 1
                ),
            });
        }

        if let Some(rl) = &self.server.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                issues.push(ConfigIssue {
                    severity: ConfigSeverity::Error,
                    field: "server.rate_limit".into(),
                    message: "requests_per_second and burst_size must be greater than 0".into(),
                });
            }
        }

        if self.database.pool_min > self.database.pool_max {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "database.pool_min".into(),
                message: "pool_min exceeds pool_max".into(),
            });
        }

        match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(
            &self.auth.clients_json,
        ) {
            Ok(map) if map.is_empty() => issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "auth.clients_json".into(),
                message: "credential table is empty".into(),
            }),
            Ok(_) => {}
            Err(e) => issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "auth.clients_json".into(),
                message: format!("not a JSON object: {e}"),
            }),
        }

        if self.steam.api_key.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "steam.api_key".into(),
                message: "STEAM_API_KEY is empty — player profile endpoints will fail".into(),
            });
        }

        issues
    }
}

/// Schema names are spliced into `SET search_path`, so only plain
/// identifiers are accepted.
fn is_valid_schema_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ── env helpers ─────────────────────────────────────────────────────

pub(crate) fn env_str(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_owned(),
    }
}

pub(crate) fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %v, "unparseable env value, using default");
            default
        }),
        _ => default,
    }
}
