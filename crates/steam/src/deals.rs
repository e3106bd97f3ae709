//! Deal aggregator client (CheapShark).
//!
//! Optional collaborator: the gateway constructs it only when deals are
//! enabled, and the deals endpoints serve empty sequences otherwise.
//! Prices arrive as decimal strings on the wire, so decoding goes
//! through one explicit conversion step.

use std::time::Duration;

use serde::Deserialize;

use sb_domain::{Error, Result};

use crate::from_reqwest;
use crate::types::Deal;

const DEFAULT_BASE_URL: &str = "https://www.cheapshark.com/api/1.0";

#[derive(Debug, Clone)]
pub struct DealsClient {
    http: reqwest::Client,
    base_url: String,
}

// ── wire shapes ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DealBody {
    #[serde(default)]
    title: String,
    #[serde(rename = "steamAppID")]
    steam_app_id: Option<String>,
    #[serde(rename = "salePrice")]
    sale_price: Option<String>,
    #[serde(rename = "normalPrice")]
    normal_price: Option<String>,
    #[serde(rename = "dealID")]
    deal_id: Option<String>,
    #[serde(default)]
    savings: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DealLookupBody {
    #[serde(rename = "gameInfo")]
    game_info: Option<DealLookupGameInfo>,
    #[serde(rename = "cheapestPrice")]
    cheapest_price: Option<DealLookupPrice>,
}

#[derive(Debug, Deserialize)]
struct DealLookupGameInfo {
    #[serde(default)]
    name: String,
    #[serde(rename = "steamAppID")]
    steam_app_id: Option<String>,
    #[serde(rename = "salePrice")]
    sale_price: Option<String>,
    #[serde(rename = "retailPrice")]
    retail_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DealLookupPrice {
    price: Option<String>,
}

impl DealsClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = format!("{}/deals", self.base_url);
        let resp = self
            .http
            .get(&url)
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
                service: "deals".into(),
                message: format!("{url} returned {status}"),
            });
        }
        let body = resp.text().await.map_err(from_reqwest)?;
        match serde_json::from_str(&body) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                tracing::warn!(url, error = %e, "undecodable deals payload");
                Ok(None)
            }
        }
    }

    /// Current on-sale deals sorted by savings, filtered to at least
    /// `min_discount` percent off.
    pub async fn get_current_deals(&self, limit: usize, min_discount: f64) -> Result<Vec<Deal>> {
        let params = [
            ("onSale", "1".to_string()),
            ("pageSize", limit.clamp(1, 500).to_string()),
            ("sortBy", "Savings".to_string()),
        ];
        let rows: Vec<DealBody> = self.get_json(&params).await?.unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter(|d| parse_price(&d.savings).unwrap_or(0.0) >= min_discount)
            .map(into_deal)
            .collect())
    }

    /// Title search across stores.
    pub async fn get_deals_for_title(&self, title: &str, limit: usize) -> Result<Vec<Deal>> {
        let params = [
            ("title", title.to_owned()),
            ("pageSize", limit.clamp(1, 500).to_string()),
        ];
        let rows: Vec<DealBody> = self.get_json(&params).await?.unwrap_or_default();
        Ok(rows.into_iter().map(into_deal).collect())
    }

    /// Deals for one specific app across stores.
    pub async fn get_deals_for_appid(&self, appid: i32) -> Result<Vec<Deal>> {
        let params = [("steamAppID", appid.to_string())];
        let rows: Vec<DealBody> = self.get_json(&params).await?.unwrap_or_default();
        Ok(rows.into_iter().map(into_deal).collect())
    }

    /// Single-deal lookup by aggregator id.
    pub async fn get_deal_by_id(&self, deal_id: &str) -> Result<Option<Deal>> {
        let params = [("id", deal_id.to_owned())];
        let body: Option<DealLookupBody> = self.get_json(&params).await?;
        let Some(body) = body else { return Ok(None) };
        let Some(info) = body.game_info else {
            return Ok(None);
        };

        let sale_price = body
            .cheapest_price
            .and_then(|p| parse_price(&p.price))
            .or_else(|| parse_price(&info.sale_price))
            .unwrap_or(0.0);

        Ok(Some(Deal {
            title: info.name,
            steam_appid: parse_appid(&info.steam_app_id),
            sale_price,
            normal_price: parse_price(&info.retail_price),
            deal_id: Some(deal_id.to_owned()),
        }))
    }
}

fn into_deal(body: DealBody) -> Deal {
    Deal {
        title: body.title,
        steam_appid: parse_appid(&body.steam_app_id),
        sale_price: parse_price(&body.sale_price).unwrap_or(0.0),
        normal_price: parse_price(&body.normal_price),
        deal_id: body.deal_id,
    }
}

fn parse_price(raw: &Option<String>) -> Option<f64> {
    raw.as_deref().and_then(|s| s.parse().ok())
}

fn parse_appid(raw: &Option<String>) -> Option<i32> {
    raw.as_deref().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deal_body_decodes_string_prices() {
        let raw = r#"{
            "title": "Portal 2",
            "steamAppID": "620",
            "salePrice": "1.47",
            "normalPrice": "9.99",
            "dealID": "abc123",
            "savings": "85.285285"
        }"#;
        let body: DealBody = serde_json::from_str(raw).expect("decode");
        let deal = into_deal(body);
        assert_eq!(deal.steam_appid, Some(620));
        assert_eq!(deal.sale_price, 1.47);
        assert_eq!(deal.normal_price, Some(9.99));
        assert_eq!(deal.deal_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn deal_body_tolerates_nulls() {
        let raw = r#"{"title": "Obscure Game", "steamAppID": null, "salePrice": "0.99"}"#;
        let body: DealBody = serde_json::from_str(raw).expect("decode");
        let deal = into_deal(body);
        assert_eq!(deal.steam_appid, None);
        assert_eq!(deal.normal_price, None);
    }

    #[test]
    fn non_numeric_appid_becomes_none() {
        assert_eq!(parse_appid(&Some("not-a-number".into())), None);
        assert_eq!(parse_appid(&Some("620".into())), Some(620));
    }
}
