//! `refresh-watched-list` — hourly most-played sync, plus first-boot
//! seeding.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use sb_domain::config::JobsConfig;
use sb_steam::SteamClient;
use sb_store::Store;

use crate::scheduler::{Job, JobOutcome};

/// How many chart entries a refresh expands.
const REFRESH_LIMIT: usize = 100;

pub struct RefreshJob {
    store: Store,
    steam: Arc<SteamClient>,
    cfg: JobsConfig,
}

impl RefreshJob {
    pub fn new(store: Store, steam: Arc<SteamClient>, cfg: JobsConfig) -> Self {
        Self { store, steam, cfg }
    }
}

#[async_trait]
impl Job for RefreshJob {
    fn name(&self) -> &'static str {
        "refresh-watched-list"
    }

    async fn run(&self, cancel: &CancellationToken) -> JobOutcome {
        let most_played = match self.steam.get_most_played(REFRESH_LIMIT).await {
            Ok(list) => list,
            Err(e) => return JobOutcome::errored(format!("fetching most-played: {e}")),
        };
        if most_played.is_empty() {
            tracing::info!("most-played list empty, skipping refresh");
            return JobOutcome::ok(0);
        }

        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.cfg.fanout_limit));
        let fetch_timeout = Duration::from_secs(self.cfg.fetch_timeout_secs);
        let write_timeout = Duration::from_secs(self.cfg.write_timeout_secs);

        let sweep = async {
            let refreshes = most_played.iter().map(|game| {
                let semaphore = semaphore.clone();
                let succeeded = succeeded.clone();
                let failed = failed.clone();
                async move {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return;
                    };
                    if cancel.is_cancelled() {
                        return;
                    }
                    let result: Result<(), String> = async {
                        let count =
                            timeout(fetch_timeout, self.steam.get_player_count(game.appid))
                                .await
                                .map_err(|_| "count fetch timed out".to_owned())?
                                .map_err(|e| e.to_string())?;
                        timeout(
                            write_timeout,
                            self.store
                                .upsert_watched(game.appid, &game.name, count.player_count),
                        )
                        .await
                        .map_err(|_| "watchlist write timed out".to_owned())?
                        .map_err(|e| e.to_string())?;
                        Ok(())
                    }
                    .await;

                    match result {
                        Ok(()) => {
                            succeeded.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(reason) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(appid = game.appid, %reason, "refresh failed");
                        }
                    }
                }
            });
            join_all(refreshes).await;
        };

        let deadline = Duration::from_secs(self.cfg.refresh_deadline_secs);
        let timed_out = tokio::select! {
            _ = cancel.cancelled() => true,
            result = timeout(deadline, sweep) => result.is_err(),
        };

        JobOutcome {
            succeeded: succeeded.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            timed_out,
            error: None,
        }
    }
}

/// Seed the watchlist from the most-played chart when it is empty.
/// Called once at startup; a populated watchlist is left untouched.
pub async fn seed_watchlist(store: &Store, steam: &SteamClient, limit: usize) -> anyhow::Result<usize> {
    let existing = store.watched_count().await?;
    if existing > 0 {
        tracing::info!(existing, "watchlist already seeded");
        return Ok(0);
    }

    tracing::info!(limit, "seeding watchlist from most-played chart");
    let most_played = steam.get_most_played(limit).await?;
    let mut inserted = 0usize;
    for game in &most_played {
        match store.upsert_watched(game.appid, &game.name, 0).await {
            Ok(()) => inserted += 1,
            Err(e) => tracing::warn!(appid = game.appid, error = %e, "seed insert failed"),
        }
    }
    tracing::info!(inserted, "watchlist seeded");
    Ok(inserted)
}
