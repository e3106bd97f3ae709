//! Periodic job driver.
//!
//! Each registered job gets its own ticker task. Runs execute inline in
//! the ticker with skip-on-miss semantics, so at most one execution per
//! job is ever in flight. At shutdown the scheduler signals
//! cancellation, waits a bounded drain window for in-flight runs, then
//! aborts whatever remains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Job contract
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Terminal accounting for one job execution.
#[derive(Debug, Default, Clone)]
pub struct JobOutcome {
    pub succeeded: usize,
    pub failed: usize,
    /// The execution hit its wall-clock cap and returned partial
    /// progress.
    pub timed_out: bool,
    /// Set when the run could not do its work at all.
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn ok(succeeded: usize) -> Self {
        Self {
            succeeded,
            ..Self::default()
        }
    }

    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    fn state(&self) -> &'static str {
        if self.error.is_some() {
            "errored"
        } else if self.timed_out {
            "timed-out"
        } else {
            "completed"
        }
    }
}

/// A periodic job. Implementations count their own per-item errors and
/// must honor the cancellation token at their suspension points.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    async fn run(&self, cancel: &CancellationToken) -> JobOutcome;
}

/// Registration entry: cadence plus the delay before the first run.
pub struct JobSpec {
    pub job: Arc<dyn Job>,
    pub interval: Duration,
    pub initial_delay: Duration,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Scheduler {
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            running: Arc::new(AtomicBool::new(true)),
            handles: Vec::new(),
        }
    }

    /// Shared liveness flag for `/health`.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Register a job and start its ticker.
    pub fn spawn(&mut self, spec: JobSpec) {
        let cancel = self.cancel.clone();
        let name = spec.job.name();
        tracing::info!(
            job = name,
            interval_secs = spec.interval.as_secs(),
            initial_delay_secs = spec.initial_delay.as_secs(),
            "job scheduled"
        );

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(spec.initial_delay) => {}
            }

            let mut interval = tokio::time::interval(spec.interval);
            // A tick that lands while the previous run is still
            // executing is skipped, not queued.
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                tracing::info!(job = name, "job running");
                let started = Instant::now();
                let outcome = spec.job.run(&cancel).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                match &outcome.error {
                    Some(error) => tracing::error!(
                        job = name,
                        state = outcome.state(),
                        elapsed_ms,
                        error = %error,
                        "job finished"
                    ),
                    None => tracing::info!(
                        job = name,
                        state = outcome.state(),
                        elapsed_ms,
                        succeeded = outcome.succeeded,
                        failed = outcome.failed,
                        "job finished"
                    ),
                }
            }
        });
        self.handles.push(handle);
    }

    /// Signal cancellation, wait up to `drain` for in-flight runs, then
    /// abort stragglers.
    pub async fn shutdown(self, drain: Duration) {
        self.running.store(false, Ordering::Relaxed);
        self.cancel.cancel();
        tracing::info!(drain_secs = drain.as_secs(), "scheduler draining");

        let mut handles = self.handles;
        let all = futures_util::future::join_all(handles.iter_mut());
        if tokio::time::timeout(drain, all).await.is_err() {
            tracing::warn!("drain window elapsed, aborting in-flight jobs");
            for handle in &handles {
                handle.abort();
            }
        }
        tracing::info!("scheduler stopped");
    }
}
