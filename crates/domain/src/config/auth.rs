use super::{env_parse, env_str};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Auth
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Placeholder secret used when `SB_TOKEN_SECRET` is unset. Kept
/// deliberately recognizable so a misconfigured deployment is obvious.
pub const INSECURE_TOKEN_SECRET: &str = "insecure-default-change-me";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens. Never logged.
    pub token_secret: String,
    pub token_ttl_secs: u64,
    /// Clock-skew leeway applied to `exp`/`iat` during verification.
    pub token_leeway_secs: u64,
    /// Raw `{"client_id": "client_secret", ...}` JSON object.
    pub clients_json: String,
    /// Maximum age (either direction) of a signed request's timestamp.
    pub timestamp_tolerance_secs: u64,
    pub nonce_ttl_secs: u64,
    pub nonce_cap: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: INSECURE_TOKEN_SECRET.into(),
            token_ttl_secs: 1200,
            token_leeway_secs: 300,
            clients_json: r#"{"desktop-main": "change-me-in-production"}"#.into(),
            timestamp_tolerance_secs: 60,
            nonce_ttl_secs: 300,
            nonce_cap: 10_000,
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let token_secret = match std::env::var("SB_TOKEN_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!(
                    "SB_TOKEN_SECRET not set — using an insecure default, \
                     issued tokens are forgeable"
                );
                INSECURE_TOKEN_SECRET.into()
            }
        };
        Self {
            token_secret,
            token_ttl_secs: env_parse("SB_TOKEN_TTL_SECS", 1200),
            token_leeway_secs: env_parse("SB_TOKEN_LEEWAY_SECS", 300),
            clients_json: env_str(
                "SB_CLIENTS_JSON",
                r#"{"desktop-main": "change-me-in-production"}"#,
            ),
            timestamp_tolerance_secs: env_parse("SB_TIMESTAMP_TOLERANCE_SECS", 60),
            nonce_ttl_secs: env_parse("SB_NONCE_TTL_SECS", 300),
            nonce_cap: env_parse("SB_NONCE_CAP", 10_000),
        }
    }
}
