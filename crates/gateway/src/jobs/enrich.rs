//! `enrich-game-metadata` — hourly storefront detail sync for every
//! watched game.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sb_steam::SteamClient;
use sb_store::Store;

use crate::scheduler::{Job, JobOutcome};

pub struct EnrichJob {
    store: Store,
    steam: Arc<SteamClient>,
}

impl EnrichJob {
    pub fn new(store: Store, steam: Arc<SteamClient>) -> Self {
        Self { store, steam }
    }
}

#[async_trait]
impl Job for EnrichJob {
    fn name(&self) -> &'static str {
        "enrich-game-metadata"
    }

    async fn run(&self, cancel: &CancellationToken) -> JobOutcome {
        let watched = match self.store.list_watched().await {
            Ok(w) => w,
            Err(e) => return JobOutcome::errored(format!("listing watchlist: {e}")),
        };

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        // Storefront detail calls are rate-limited upstream; walking
        // the list sequentially keeps this job polite.
        for game in &watched {
            if cancel.is_cancelled() {
                break;
            }
            match self.steam.get_app_details(game.appid).await {
                Ok(Some(details)) => {
                    match self.store.upsert_metadata(&details, true).await {
                        Ok(()) => succeeded += 1,
                        Err(e) => {
                            failed += 1;
                            tracing::warn!(appid = game.appid, error = %e, "metadata write failed");
                        }
                    }
                }
                Ok(None) => {
                    tracing::debug!(appid = game.appid, "no storefront detail this tick");
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(appid = game.appid, error = %e, "detail fetch failed");
                }
            }
        }

        JobOutcome {
            succeeded,
            failed,
            timed_out: cancel.is_cancelled(),
            error: None,
        }
    }
}
