//! Steam upstream client.
//!
//! One pooled `reqwest::Client` issues JSON GETs against the Web API
//! and storefront hosts. Known "not found" shapes come back as sentinel
//! empty values so fan-out callers need no special-casing; network
//! errors and 5xx propagate as recoverable failures and the caller
//! decides retry policy. No retries happen here.

pub mod deals;
pub mod html;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use sb_domain::config::SteamConfig;
use sb_domain::{Error, Result};

use crate::html::strip_html;
use crate::types::*;

/// Fan-out cap for per-entry detail fetches inside list endpoints.
const DETAIL_FANOUT: usize = 10;

#[derive(Debug, Clone)]
pub struct SteamClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    store_base: String,
    country: String,
    language: String,
}

impl SteamClient {
    pub fn new(cfg: &SteamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            api_base: "https://api.steampowered.com".into(),
            store_base: "https://store.steampowered.com".into(),
            country: cfg.country.clone(),
            language: cfg.language.clone(),
        })
    }

    /// Point both hosts at a different base URL. Used by tests to run
    /// against a local mock server.
    pub fn with_base_urls(mut self, api_base: &str, store_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_owned();
        self.store_base = store_base.trim_end_matches('/').to_owned();
        self
    }

    // ── request plumbing ─────────────────────────────────────────────

    /// GET a JSON document. `Ok(None)` is the sentinel for 4xx
    /// ("definite not found"); 5xx and transport errors are returned
    /// as recoverable failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>> {
        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if status.is_client_error() {
            return Ok(None);
        }
        if status.is_server_error() {
            return Err(Error::Upstream {
                service: "steam".into(),
                message: format!("{url} returned {status}"),
            });
        }

        let body = resp.text().await.map_err(from_reqwest)?;
        match serde_json::from_str(&body) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                tracing::warn!(url, error = %e, "undecodable upstream payload");
                Ok(None)
            }
        }
    }

    // ── endpoints ────────────────────────────────────────────────────

    /// Current player population. Absent or invalid upstream payloads
    /// yield a zero count with a warning, never an error.
    pub async fn get_player_count(&self, appid: i32) -> Result<PlayerCount> {
        let url = format!(
            "{}/ISteamUserStats/GetNumberOfCurrentPlayers/v1/",
            self.api_base
        );
        let data: Option<PlayerCountEnvelope> = self
            .get_json(&url, &[("appid", appid.to_string())])
            .await?;

        let count = data
            .and_then(|e| e.response)
            .map(|b| b.player_count.clamp(0, i32::MAX as i64) as i32);
        match count {
            Some(player_count) => Ok(PlayerCount {
                appid,
                player_count,
            }),
            None => {
                tracing::warn!(appid, "no player count in upstream payload");
                Ok(PlayerCount {
                    appid,
                    player_count: 0,
                })
            }
        }
    }

    /// Storefront detail for one app. `None` when the storefront has no
    /// (successful) entry for the id.
    pub async fn get_app_details(&self, appid: i32) -> Result<Option<GameDetails>> {
        let url = format!("{}/api/appdetails", self.store_base);
        let params = [
            ("appids", appid.to_string()),
            ("cc", self.country.clone()),
            ("l", self.language.clone()),
        ];
        let data: Option<std::collections::HashMap<String, AppDetailsEntry>> =
            self.get_json(&url, &params).await?;

        let entry = data.and_then(|mut m| m.remove(&appid.to_string()));
        let details = match entry {
            Some(AppDetailsEntry {
                success: true,
                data: Some(d),
            }) => d,
            _ => {
                tracing::debug!(appid, "no storefront detail for app");
                return Ok(None);
            }
        };

        Ok(Some(GameDetails {
            appid: if details.steam_appid > 0 {
                details.steam_appid
            } else {
                appid
            },
            name: details.name,
            is_free: details.is_free,
            price: details
                .price_overview
                .map(|p| rust_decimal::Decimal::new(p.final_price, 2))
                .unwrap_or_default(),
            detailed_description: strip_html(&details.detailed_description),
            header_image: details.header_image,
            background_image: details.background,
            coming_soon: details
                .release_date
                .as_ref()
                .map(|r| r.coming_soon)
                .unwrap_or(false),
            release_date: details.release_date.and_then(|r| r.date),
            genres: tag_descriptions(details.genres),
            categories: tag_descriptions(details.categories),
        }))
    }

    /// The most-played chart, enriched with storefront detail per rank.
    /// Rank order is preserved; entries whose detail fetch fails are
    /// dropped. `limit` caps how many ranks are expanded.
    pub async fn get_most_played(&self, limit: usize) -> Result<Vec<GameDetails>> {
        let url = format!(
            "{}/ISteamChartsService/GetMostPlayedGames/v1/",
            self.api_base
        );
        let data: Option<MostPlayedEnvelope> = self.get_json(&url, &[]).await?;
        let ranks = data
            .and_then(|e| e.response)
            .map(|b| b.ranks)
            .unwrap_or_default();

        let semaphore = Arc::new(Semaphore::new(DETAIL_FANOUT));
        let fetches = ranks.iter().take(limit).map(|rank| {
            let semaphore = semaphore.clone();
            let appid = rank.appid;
            async move {
                let _permit = semaphore.acquire().await.ok()?;
                match self.get_app_details(appid).await {
                    Ok(details) => details,
                    Err(e) => {
                        tracing::warn!(appid, error = %e, "detail fetch failed for chart entry");
                        None
                    }
                }
            }
        });

        Ok(join_all(fetches).await.into_iter().flatten().collect())
    }

    /// Upcoming releases from the storefront featured feed.
    pub async fn get_coming_soon(&self) -> Result<Vec<GameDetails>> {
        let url = format!("{}/api/featuredcategories/", self.store_base);
        let params = [("cc", self.country.clone()), ("l", self.language.clone())];
        let data: Option<FeaturedCategoriesEnvelope> = self.get_json(&url, &params).await?;

        let items = data
            .and_then(|e| e.coming_soon)
            .map(|c| c.items)
            .unwrap_or_default();
        Ok(items
            .into_iter()
            .map(|item| GameDetails {
                appid: item.id,
                name: item.name,
                is_free: item.final_price <= 0,
                price: rust_decimal::Decimal::new(item.final_price, 2),
                detailed_description: String::new(),
                header_image: item.header_image,
                background_image: item.large_capsule_image,
                coming_soon: true,
                release_date: item.release_date,
                genres: Vec::new(),
                categories: Vec::new(),
            })
            .collect())
    }

    /// Owned library for a player, free titles included.
    pub async fn get_owned_games(&self, steam_id: &str) -> Result<Vec<PlayerGameOverview>> {
        let url = format!("{}/IPlayerService/GetOwnedGames/v1/", self.api_base);
        let params = [
            ("key", self.api_key.clone()),
            ("steamid", steam_id.to_owned()),
            ("include_appinfo", "true".into()),
            ("include_played_free_games", "true".into()),
        ];
        let data: Option<OwnedGamesEnvelope> = self.get_json(&url, &params).await?;
        Ok(overviews(data.and_then(|e| e.response)))
    }

    /// Games played within the last two weeks.
    pub async fn get_recently_played(&self, steam_id: &str) -> Result<Vec<PlayerGameOverview>> {
        let url = format!(
            "{}/IPlayerService/GetRecentlyPlayedGames/v1/",
            self.api_base
        );
        let params = [
            ("key", self.api_key.clone()),
            ("steamid", steam_id.to_owned()),
            ("include_appinfo", "true".into()),
        ];
        let data: Option<OwnedGamesEnvelope> = self.get_json(&url, &params).await?;
        Ok(overviews(data.and_then(|e| e.response)))
    }

    /// Public profile summary; `None` when the id is unknown.
    pub async fn get_player_summary(&self, steam_id: &str) -> Result<Option<PlayerSummary>> {
        let url = format!("{}/ISteamUser/GetPlayerSummaries/v2/", self.api_base);
        let params = [
            ("key", self.api_key.clone()),
            ("steamids", steam_id.to_owned()),
        ];
        let data: Option<PlayerSummariesEnvelope> = self.get_json(&url, &params).await?;
        Ok(data
            .and_then(|e| e.response)
            .and_then(|b| b.players.into_iter().next()))
    }

    /// Resolve a vanity name (or profile URL, or already-numeric id) to
    /// a 64-bit steam id.
    pub async fn resolve_vanity(&self, vanity: &str) -> Result<Option<String>> {
        let name = extract_vanity_name(vanity);
        if name.is_empty() {
            return Ok(None);
        }
        // Already a 17-digit id — nothing to resolve.
        if name.len() == 17 && name.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Some(name));
        }

        let url = format!("{}/ISteamUser/ResolveVanityURL/v1/", self.api_base);
        let params = [("key", self.api_key.clone()), ("vanityurl", name.clone())];
        let data: Option<ResolveVanityEnvelope> = self.get_json(&url, &params).await?;

        match data.and_then(|e| e.response) {
            Some(body) if body.success == 1 => Ok(body.steamid),
            _ => {
                tracing::debug!(vanity = %name, "vanity name did not resolve");
                Ok(None)
            }
        }
    }
}

fn overviews(body: Option<OwnedGamesBody>) -> Vec<PlayerGameOverview> {
    body.map(|b| b.games)
        .unwrap_or_default()
        .into_iter()
        .map(|g| PlayerGameOverview {
            appid: g.appid,
            name: g.name,
            playtime_forever: g.playtime_forever,
            playtime_2weeks: g.playtime_2weeks,
            img_icon_url: g.img_icon_url,
        })
        .collect()
}

fn tag_descriptions(tags: Vec<TagBody>) -> Vec<String> {
    tags.into_iter()
        .filter_map(|t| t.description)
        .filter(|d| !d.is_empty())
        .collect()
}

/// Pull the vanity segment out of a bare name or a profile URL
/// (`…steamcommunity.com/id/<name>` / `/profiles/<id>`).
pub fn extract_vanity_name(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if !trimmed.contains('/') {
        return trimmed.to_owned();
    }
    let parts: Vec<&str> = trimmed.split('/').filter(|p| !p.is_empty()).collect();
    for (i, part) in parts.iter().enumerate() {
        if (*part == "id" || *part == "profiles") && i + 1 < parts.len() {
            return parts[i + 1].to_owned();
        }
    }
    parts.last().map(|s| (*s).to_owned()).unwrap_or_default()
}

/// Convert a `reqwest::Error` into a domain error. Timeouts become
/// `Error::Timeout`; everything else `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanity_extraction() {
        assert_eq!(extract_vanity_name("gaben"), "gaben");
        assert_eq!(
            extract_vanity_name("https://steamcommunity.com/id/gaben/"),
            "gaben"
        );
        assert_eq!(
            extract_vanity_name("steamcommunity.com/id/customname"),
            "customname"
        );
        assert_eq!(
            extract_vanity_name("https://steamcommunity.com/profiles/76561197960287930"),
            "76561197960287930"
        );
        assert_eq!(extract_vanity_name("/id/username"), "username");
        assert_eq!(extract_vanity_name("  spaced  "), "spaced");
    }

    #[test]
    fn player_count_envelope_decodes() {
        let raw = r#"{"response": {"player_count": 581990, "result": 1}}"#;
        let env: PlayerCountEnvelope = serde_json::from_str(raw).expect("decode");
        assert_eq!(env.response.expect("body").player_count, 581_990);
    }

    #[test]
    fn player_count_envelope_tolerates_missing_count() {
        let raw = r#"{"response": {"result": 42}}"#;
        let env: PlayerCountEnvelope = serde_json::from_str(raw).expect("decode");
        assert_eq!(env.response.expect("body").player_count, 0);
    }

    #[test]
    fn app_details_entry_decodes() {
        let raw = r#"{
            "success": true,
            "data": {
                "steam_appid": 730,
                "name": "Counter-Strike 2",
                "is_free": true,
                "detailed_description": "<p>The premier <b>FPS</b></p>",
                "header_image": "https://cdn/header.jpg",
                "background": "https://cdn/bg.jpg",
                "release_date": {"coming_soon": false, "date": "21 Aug, 2012"},
                "genres": [{"id": "1", "description": "Action"}],
                "categories": [{"id": 1, "description": "Multi-player"}]
            }
        }"#;
        let entry: AppDetailsEntry = serde_json::from_str(raw).expect("decode");
        assert!(entry.success);
        let data = entry.data.expect("data");
        assert_eq!(data.steam_appid, 730);
        assert_eq!(data.genres[0].description.as_deref(), Some("Action"));
    }

    #[test]
    fn app_details_failure_shape() {
        let raw = r#"{"success": false}"#;
        let entry: AppDetailsEntry = serde_json::from_str(raw).expect("decode");
        assert!(!entry.success);
        assert!(entry.data.is_none());
    }

    #[test]
    fn most_played_envelope_decodes() {
        let raw = r#"{"response": {"ranks": [{"rank": 1, "appid": 730}, {"rank": 2, "appid": 570}]}}"#;
        let env: MostPlayedEnvelope = serde_json::from_str(raw).expect("decode");
        let ranks = env.response.expect("body").ranks;
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].appid, 730);
    }
}
