use super::env_parse;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduler & collection jobs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub sample_interval_secs: u64,
    pub refresh_interval_secs: u64,
    pub enrich_interval_secs: u64,
    pub enrich_initial_delay_secs: u64,
    pub rollup_hourly_interval_secs: u64,
    pub rollup_daily_interval_secs: u64,
    pub purge_interval_secs: u64,

    /// Outbound fan-out cap per job execution.
    pub fanout_limit: usize,
    pub fetch_timeout_secs: u64,
    pub write_timeout_secs: u64,
    /// Wall-clock cap for one sample sweep.
    pub sample_deadline_secs: u64,
    /// Wall-clock cap for one watchlist refresh.
    pub refresh_deadline_secs: u64,

    pub raw_retention_days: i64,
    pub hourly_retention_days: i64,
    pub daily_retention_days: i64,

    /// How long shutdown waits for in-flight jobs before tearing down.
    pub drain_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 300,
            refresh_interval_secs: 3600,
            enrich_interval_secs: 3600,
            enrich_initial_delay_secs: 120,
            rollup_hourly_interval_secs: 3600,
            rollup_daily_interval_secs: 86_400,
            purge_interval_secs: 86_400,
            fanout_limit: 10,
            fetch_timeout_secs: 10,
            write_timeout_secs: 5,
            sample_deadline_secs: 240,
            refresh_deadline_secs: 300,
            raw_retention_days: 14,
            hourly_retention_days: 30,
            daily_retention_days: 90,
            drain_secs: 30,
        }
    }
}

impl JobsConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            sample_interval_secs: env_parse("SB_SAMPLE_INTERVAL_SECS", d.sample_interval_secs),
            refresh_interval_secs: env_parse("SB_REFRESH_INTERVAL_SECS", d.refresh_interval_secs),
            enrich_interval_secs: env_parse("SB_ENRICH_INTERVAL_SECS", d.enrich_interval_secs),
            enrich_initial_delay_secs: env_parse(
                "SB_ENRICH_INITIAL_DELAY_SECS",
                d.enrich_initial_delay_secs,
            ),
            rollup_hourly_interval_secs: env_parse(
                "SB_ROLLUP_HOURLY_INTERVAL_SECS",
                d.rollup_hourly_interval_secs,
            ),
            rollup_daily_interval_secs: env_parse(
                "SB_ROLLUP_DAILY_INTERVAL_SECS",
                d.rollup_daily_interval_secs,
            ),
            purge_interval_secs: env_parse("SB_PURGE_INTERVAL_SECS", d.purge_interval_secs),
            fanout_limit: env_parse("SB_FANOUT_LIMIT", d.fanout_limit),
            fetch_timeout_secs: env_parse("SB_FETCH_TIMEOUT_SECS", d.fetch_timeout_secs),
            write_timeout_secs: env_parse("SB_WRITE_TIMEOUT_SECS", d.write_timeout_secs),
            sample_deadline_secs: env_parse("SB_SAMPLE_DEADLINE_SECS", d.sample_deadline_secs),
            refresh_deadline_secs: env_parse("SB_REFRESH_DEADLINE_SECS", d.refresh_deadline_secs),
            raw_retention_days: env_parse("SB_RAW_RETENTION_DAYS", d.raw_retention_days),
            hourly_retention_days: env_parse("SB_HOURLY_RETENTION_DAYS", d.hourly_retention_days),
            daily_retention_days: env_parse("SB_DAILY_RETENTION_DAYS", d.daily_retention_days),
            drain_secs: env_parse("SB_DRAIN_SECS", d.drain_secs),
        }
    }
}
