//! Rollup and retention jobs. These delegate to the store; tail
//! windows overlap deliberately so a late sample is still captured on
//! the next pass.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sb_domain::config::JobsConfig;
use sb_store::Store;

use crate::scheduler::{Job, JobOutcome};

const HOURLY_TAIL_SECS: i64 = 3 * 3600;
const DAILY_TAIL_SECS: i64 = 3 * 86_400;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// rollup-hourly
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct RollupHourlyJob {
    store: Store,
}

impl RollupHourlyJob {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Job for RollupHourlyJob {
    fn name(&self) -> &'static str {
        "rollup-hourly"
    }

    async fn run(&self, _cancel: &CancellationToken) -> JobOutcome {
        let since = sb_auth::unix_now() - HOURLY_TAIL_SECS;
        match self.store.rollup_hourly(Some(since), None, None).await {
            Ok(buckets) => JobOutcome::ok(buckets as usize),
            Err(e) => JobOutcome::errored(format!("hourly rollup: {e}")),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// rollup-daily
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct RollupDailyJob {
    store: Store,
}

impl RollupDailyJob {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Job for RollupDailyJob {
    fn name(&self) -> &'static str {
        "rollup-daily"
    }

    async fn run(&self, _cancel: &CancellationToken) -> JobOutcome {
        let since = sb_auth::unix_now() - DAILY_TAIL_SECS;
        match self.store.rollup_daily(Some(since), None, None).await {
            Ok(buckets) => JobOutcome::ok(buckets as usize),
            Err(e) => JobOutcome::errored(format!("daily rollup: {e}")),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// purge-hourly / purge-daily
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Raw + hourly retention. The cutoff uses wall-clock Unix seconds.
pub struct PurgeHourlyJob {
    store: Store,
    cfg: JobsConfig,
}

impl PurgeHourlyJob {
    pub fn new(store: Store, cfg: JobsConfig) -> Self {
        Self { store, cfg }
    }
}

#[async_trait]
impl Job for PurgeHourlyJob {
    fn name(&self) -> &'static str {
        "purge-hourly"
    }

    async fn run(&self, _cancel: &CancellationToken) -> JobOutcome {
        let now = sb_auth::unix_now();
        let raw = match self.store.purge_raw(now, self.cfg.raw_retention_days).await {
            Ok(n) => n,
            Err(e) => return JobOutcome::errored(format!("raw purge: {e}")),
        };
        let hourly = match self
            .store
            .purge_hourly(now, self.cfg.hourly_retention_days)
            .await
        {
            Ok(n) => n,
            Err(e) => return JobOutcome::errored(format!("hourly purge: {e}")),
        };
        tracing::info!(raw_deleted = raw, hourly_deleted = hourly, "retention applied");
        JobOutcome::ok((raw + hourly) as usize)
    }
}

/// Daily-bucket retention.
pub struct PurgeDailyJob {
    store: Store,
    cfg: JobsConfig,
}

impl PurgeDailyJob {
    pub fn new(store: Store, cfg: JobsConfig) -> Self {
        Self { store, cfg }
    }
}

#[async_trait]
impl Job for PurgeDailyJob {
    fn name(&self) -> &'static str {
        "purge-daily"
    }

    async fn run(&self, _cancel: &CancellationToken) -> JobOutcome {
        let now = sb_auth::unix_now();
        match self
            .store
            .purge_daily(now, self.cfg.daily_retention_days)
            .await
        {
            Ok(deleted) => JobOutcome::ok(deleted as usize),
            Err(e) => JobOutcome::errored(format!("daily purge: {e}")),
        }
    }
}
