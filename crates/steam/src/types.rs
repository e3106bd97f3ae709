//! Typed records decoded from upstream JSON.
//!
//! Wire-level envelope structs stay private to the crate; the public
//! records below are what the store and the API serve. Unknown fields
//! are ignored everywhere.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public records
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Current player population for one app.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerCount {
    pub appid: i32,
    pub player_count: i32,
}

/// Storefront detail for one app, with the description already
/// stripped of HTML at ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct GameDetails {
    pub appid: i32,
    pub name: String,
    pub is_free: bool,
    /// Final storefront price in the configured country's currency.
    pub price: Decimal,
    pub detailed_description: String,
    pub header_image: String,
    pub background_image: String,
    pub coming_soon: bool,
    pub release_date: Option<String>,
    pub genres: Vec<String>,
    pub categories: Vec<String>,
}

/// One entry of a player's library or recent-play list.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerGameOverview {
    pub appid: i32,
    pub name: String,
    pub playtime_forever: i64,
    pub playtime_2weeks: i64,
    pub img_icon_url: String,
}

/// Public profile summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub steamid: String,
    #[serde(default)]
    pub personaname: String,
    #[serde(default)]
    pub profileurl: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub avatarfull: String,
    #[serde(default)]
    pub personastate: i32,
    #[serde(default)]
    pub lastlogoff: Option<i64>,
    #[serde(default)]
    pub timecreated: Option<i64>,
    #[serde(default)]
    pub loccountrycode: Option<String>,
}

/// A storefront deal from the aggregator collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct Deal {
    pub title: String,
    pub steam_appid: Option<i32>,
    pub sale_price: f64,
    pub normal_price: Option<f64>,
    pub deal_id: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire envelopes (crate-private)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerCountEnvelope {
    pub response: Option<PlayerCountBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerCountBody {
    #[serde(default)]
    pub player_count: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppDetailsEntry {
    #[serde(default)]
    pub success: bool,
    pub data: Option<AppDetailsData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppDetailsData {
    #[serde(default = "default_appid")]
    pub steam_appid: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_free: bool,
    pub price_overview: Option<PriceOverview>,
    #[serde(default)]
    pub detailed_description: String,
    #[serde(default)]
    pub header_image: String,
    #[serde(default)]
    pub background: String,
    pub release_date: Option<ReleaseDateBody>,
    #[serde(default)]
    pub categories: Vec<TagBody>,
    #[serde(default)]
    pub genres: Vec<TagBody>,
}

fn default_appid() -> i32 {
    -1
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriceOverview {
    /// Final price in minor units (grosze/cents).
    #[serde(rename = "final", default)]
    pub final_price: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseDateBody {
    #[serde(default)]
    pub coming_soon: bool,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagBody {
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MostPlayedEnvelope {
    pub response: Option<MostPlayedBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MostPlayedBody {
    #[serde(default)]
    pub ranks: Vec<MostPlayedRank>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MostPlayedRank {
    #[serde(default = "default_appid")]
    pub appid: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedCategoriesEnvelope {
    pub coming_soon: Option<FeaturedItems>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedItems {
    #[serde(default)]
    pub items: Vec<FeaturedItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedItem {
    #[serde(default = "default_appid")]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub final_price: i64,
    #[serde(default)]
    pub header_image: String,
    #[serde(default)]
    pub large_capsule_image: String,
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnedGamesEnvelope {
    pub response: Option<OwnedGamesBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnedGamesBody {
    #[serde(default)]
    pub games: Vec<OwnedGameBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnedGameBody {
    #[serde(default = "default_appid")]
    pub appid: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub playtime_forever: i64,
    #[serde(default)]
    pub playtime_2weeks: i64,
    #[serde(default)]
    pub img_icon_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerSummariesEnvelope {
    pub response: Option<PlayerSummariesBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerSummariesBody {
    #[serde(default)]
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveVanityEnvelope {
    pub response: Option<ResolveVanityBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveVanityBody {
    #[serde(default)]
    pub success: i32,
    pub steamid: Option<String>,
    #[allow(dead_code)]
    pub message: Option<String>,
}
