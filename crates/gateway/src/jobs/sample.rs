//! `sample-current-counts` — the 5-minute collection sweep.

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
use sb_store::{Store, WatchedGame};

use crate::scheduler::{Job, JobOutcome};

pub struct SampleJob {
    store: Store,
    steam: Arc<SteamClient>,
    cfg: JobsConfig,
}

impl SampleJob {
    pub fn new(store: Store, steam: Arc<SteamClient>, cfg: JobsConfig) -> Self {
        Self { store, steam, cfg }
    }

    /// Fetch and persist one count. Individual failures are counted by
    /// the caller and never abort the batch.
    async fn sample_one(&self, game: &WatchedGame, now: i64) -> Result<(), String> {
        let fetch_timeout = Duration::from_secs(self.cfg.fetch_timeout_secs);
        let write_timeout = Duration::from_secs(self.cfg.write_timeout_secs);

        let count = timeout(fetch_timeout, self.steam.get_player_count(game.appid))
            .await
            .map_err(|_| format!("count fetch timed out for appid={}", game.appid))?
            .map_err(|e| format!("count fetch failed for appid={}: {e}", game.appid))?;

        timeout(
            write_timeout,
            self.store.insert_raw(game.appid, now, count.player_count),
        )
        .await
        .map_err(|_| format!("raw insert timed out for appid={}", game.appid))?
        .map_err(|e| format!("raw insert failed for appid={}: {e}", game.appid))?;

        timeout(
            write_timeout,
            self.store
                .upsert_watched(game.appid, &game.name, count.player_count),
        )
        .await
        .map_err(|_| format!("watchlist update timed out for appid={}", game.appid))?
        .map_err(|e| format!("watchlist update failed for appid={}: {e}", game.appid))?;

        tracing::debug!(
            appid = game.appid,
            count = count.player_count,
            "sample recorded"
        );
        Ok(())
    }
}

#[async_trait]
impl Job for SampleJob {
    fn name(&self) -> &'static str {
        "sample-current-counts"
    }

    async fn run(&self, cancel: &CancellationToken) -> JobOutcome {
        let watched = match self.store.list_watched().await {
            Ok(w) => w,
            Err(e) => return JobOutcome::errored(format!("listing watchlist: {e}")),
        };
        if watched.is_empty() {
            tracing::info!("watchlist empty, nothing to sample");
            return JobOutcome::ok(0);
        }

        let now = sb_auth::unix_now();
        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.cfg.fanout_limit));

        let sweep = async {
            let fetches = watched.iter().map(|game| {
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
                    match self.sample_one(game, now).await {
                        Ok(()) => {
                            succeeded.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(reason) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(appid = game.appid, %reason, "sample failed");
                        }
                    }
                }
            });
            join_all(fetches).await;
        };

        let deadline = Duration::from_secs(self.cfg.sample_deadline_secs);
        let timed_out = tokio::select! {
            _ = cancel.cancelled() => true,
            result = timeout(deadline, sweep) => result.is_err(),
        };
        if timed_out {
            tracing::warn!(
                deadline_secs = deadline.as_secs(),
                "sample sweep stopped early, keeping partial progress"
            );
        }

        JobOutcome {
            succeeded: succeeded.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            timed_out,
            error: None,
        }
    }
}
