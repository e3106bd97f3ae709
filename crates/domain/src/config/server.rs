use super::{env_parse, env_str};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `None` disables per-caller rate limiting.
    pub rate_limit: Option<RateLimitConfig>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u64,
    pub burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            rate_limit: Some(RateLimitConfig::default()),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 30,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let per_second: u64 = env_parse("SB_RATE_LIMIT_PER_SEC", 10);
        let rate_limit = (per_second > 0).then(|| RateLimitConfig {
            requests_per_second: per_second,
            burst_size: env_parse("SB_RATE_LIMIT_BURST", 30),
        });
        Self {
            host: env_str("SB_HOST", "0.0.0.0"),
            port: env_parse("SB_PORT", 8000),
            rate_limit,
        }
    }
}
