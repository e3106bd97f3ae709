//! Input validation in front of every endpoint. Nothing here touches
//! the store; rejects happen before any database work.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::error::ApiError;

pub const MAX_APPID: i64 = 10_000_000;
pub const MAX_BATCH_IDS: usize = 100;

/// App ids are positive and below ten million.
pub fn validate_appid(appid: i64) -> Result<i32, ApiError> {
    if appid <= 0 {
        return Err(ApiError::Validation("appid must be positive".into()));
    }
    if appid >= MAX_APPID {
        return Err(ApiError::Validation("appid out of range".into()));
    }
    Ok(appid as i32)
}

/// Batch lists carry 1–100 ids; duplicates are dropped while keeping
/// first-seen order. Oversized or empty lists are shape violations.
pub fn validate_appid_list(appids: &[i64]) -> Result<Vec<i32>, ApiError> {
    if appids.is_empty() {
        return Err(ApiError::Unprocessable("appid list cannot be empty".into()));
    }
    if appids.len() > MAX_BATCH_IDS {
        return Err(ApiError::Unprocessable(format!(
            "at most {MAX_BATCH_IDS} appids per request"
        )));
    }
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(appids.len());
    for raw in appids {
        let appid = validate_appid(*raw)?;
        if seen.insert(appid) {
            out.push(appid);
        }
    }
    Ok(out)
}

/// A player identifier as accepted on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SteamIdent {
    /// 17-digit decimal id.
    Id64(String),
    /// Community vanity name, resolvable upstream.
    Vanity(String),
}

fn profile_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https://)?(?:www\.)?steamcommunity\.com/(id|profiles)/([A-Za-z0-9_-]+)/?$")
            .expect("valid regex")
    })
}

fn vanity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{2,32}$").expect("valid regex"))
}

fn is_id64(s: &str) -> bool {
    s.len() == 17 && s.starts_with("7656119") && s.chars().all(|c| c.is_ascii_digit())
}

/// Accepts a 17-digit id starting `7656119`, a 2–32 char vanity name,
/// or a full community profile URL wrapping either.
pub fn parse_steam_ident(raw: &str) -> Result<SteamIdent, ApiError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ApiError::Validation("player identifier cannot be empty".into()));
    }

    if value.chars().all(|c| c.is_ascii_digit()) {
        if is_id64(value) {
            return Ok(SteamIdent::Id64(value.to_owned()));
        }
        return Err(ApiError::Validation(
            "numeric player id must be 17 digits starting with 7656119".into(),
        ));
    }

    if let Some(caps) = profile_url_re().captures(value) {
        let kind = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        return match kind {
            "profiles" if is_id64(name) => Ok(SteamIdent::Id64(name.to_owned())),
            "profiles" => Err(ApiError::Validation(
                "profile URL must wrap a 17-digit player id".into(),
            )),
            _ => Ok(SteamIdent::Vanity(name.to_owned())),
        };
    }

    if vanity_re().is_match(value) {
        return Ok(SteamIdent::Vanity(value.to_owned()));
    }
    Err(ApiError::Validation("malformed player identifier".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appid_bounds() {
        assert!(validate_appid(1).is_ok());
        assert_eq!(validate_appid(9_999_999).expect("in range"), 9_999_999);
        assert!(validate_appid(0).is_err());
        assert!(validate_appid(-5).is_err());
        assert!(validate_appid(10_000_000).is_err());
    }

    #[test]
    fn batch_list_boundaries() {
        let exactly_100: Vec<i64> = (1..=100).collect();
        assert_eq!(validate_appid_list(&exactly_100).expect("accepted").len(), 100);

        let one_too_many: Vec<i64> = (1..=101).collect();
        assert!(matches!(
            validate_appid_list(&one_too_many),
            Err(ApiError::Unprocessable(_))
        ));
        assert!(matches!(
            validate_appid_list(&[]),
            Err(ApiError::Unprocessable(_))
        ));
    }

    #[test]
    fn batch_list_dedupes_preserving_order() {
        let ids = validate_appid_list(&[730, 570, 730, 440]).expect("valid");
        assert_eq!(ids, vec![730, 570, 440]);
    }

    #[test]
    fn batch_list_rejects_bad_entries() {
        assert!(matches!(
            validate_appid_list(&[730, 0]),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn steam_id64_accepted() {
        assert_eq!(
            parse_steam_ident("76561197960287930").expect("valid"),
            SteamIdent::Id64("76561197960287930".into())
        );
    }

    #[test]
    fn numeric_but_not_id64_rejected() {
        assert!(parse_steam_ident("12345678901234567").is_err());
        assert!(parse_steam_ident("7656119").is_err());
    }

    #[test]
    fn vanity_names() {
        assert_eq!(
            parse_steam_ident("gaben").expect("valid"),
            SteamIdent::Vanity("gaben".into())
        );
        assert_eq!(
            parse_steam_ident("my_custom-name").expect("valid"),
            SteamIdent::Vanity("my_custom-name".into())
        );
        assert!(parse_steam_ident("a").is_err(), "too short");
        assert!(parse_steam_ident(&"x".repeat(33)).is_err(), "too long");
        assert!(parse_steam_ident("has space").is_err());
    }

    #[test]
    fn profile_urls() {
        assert_eq!(
            parse_steam_ident("https://steamcommunity.com/id/gaben/").expect("valid"),
            SteamIdent::Vanity("gaben".into())
        );
        assert_eq!(
            parse_steam_ident("https://steamcommunity.com/profiles/76561197960287930")
                .expect("valid"),
            SteamIdent::Id64("76561197960287930".into())
        );
        assert!(parse_steam_ident("https://steamcommunity.com/profiles/123").is_err());
        assert!(parse_steam_ident("https://evil.example.com/id/gaben").is_err());
    }
}
