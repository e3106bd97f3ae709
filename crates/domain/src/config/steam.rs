use super::{env_parse, env_str};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Steam upstream
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct SteamConfig {
    pub api_key: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Storefront country code, controls the price currency.
    pub country: String,
    pub language: String,
    /// Deal aggregator is an optional collaborator; disabling it makes
    /// the deals endpoints serve empty sequences.
    pub deals_enabled: bool,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            country: "pl".into(),
            language: "en".into(),
            deals_enabled: true,
        }
    }
}

impl SteamConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_str("STEAM_API_KEY", ""),
            timeout_secs: env_parse("SB_STEAM_TIMEOUT_SECS", 30),
            connect_timeout_secs: env_parse("SB_STEAM_CONNECT_TIMEOUT_SECS", 10),
            country: env_str("SB_STEAM_COUNTRY", "pl"),
            language: env_str("SB_STEAM_LANGUAGE", "en"),
            deals_enabled: env_parse("SB_DEALS_ENABLED", true),
        }
    }
}
