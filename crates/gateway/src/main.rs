use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sb_auth::{ClientRegistry, NonceCache, SignatureVerifier, TokenIssuer};
use sb_domain::config::{Config, ConfigSeverity};
use sb_gateway::api;
use sb_gateway::api::guard::CallerKeyExtractor;
use sb_gateway::jobs::{
    seed_watchlist, EnrichJob, PurgeDailyJob, PurgeHourlyJob, RefreshJob, RollupDailyJob,
    RollupHourlyJob, SampleJob,
};
use sb_gateway::scheduler::{JobSpec, Scheduler};
use sb_gateway::state::AppState;
use sb_steam::deals::DealsClient;
use sb_steam::SteamClient;
use sb_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = sb_gateway::cli::Cli::parse();
    let config = load_config()?;

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(sb_gateway::cli::Command::Serve) => run_server(Arc::new(config)).await,
        Some(sb_gateway::cli::Command::Retention { cmd }) => {
            sb_gateway::cli::retention::run(cmd, &config).await
        }
    }
}

/// Structured JSON tracing; filter via `SB_LOG`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SB_LOG")
                .unwrap_or_else(|_| EnvFilter::new("info,sb_gateway=debug")),
        )
        .json()
        .init();
}

/// Read the environment config and abort on hard errors.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::from_env();
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }
    Ok(config)
}

/// Start the server: store, auth, scheduler, HTTP listener.
async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("steamboard starting");

    // ── Store ────────────────────────────────────────────────────────
    let store = Store::connect(&config.database)
        .await
        .context("connecting to database")?;
    store
        .init_schema()
        .await
        .context("initializing database schema")?;

    // ── Upstream clients ─────────────────────────────────────────────
    let steam = Arc::new(SteamClient::new(&config.steam).context("building steam client")?);
    let deals = if config.steam.deals_enabled {
        Some(Arc::new(
            DealsClient::new(config.steam.timeout_secs).context("building deals client")?,
        ))
    } else {
        tracing::info!("deal aggregator disabled, deals endpoints serve empty lists");
        None
    };

    // ── Auth core ────────────────────────────────────────────────────
    let registry = ClientRegistry::from_json(&config.auth.clients_json)
        .context("parsing credential table")?;
    tracing::info!(clients = registry.len(), "credential table loaded");
    let tokens = Arc::new(TokenIssuer::new(
        &config.auth.token_secret,
        config.auth.token_ttl_secs,
        config.auth.token_leeway_secs,
    ));
    let verifier = Arc::new(SignatureVerifier::new(
        registry,
        NonceCache::new(
            config.auth.nonce_cap,
            Duration::from_secs(config.auth.nonce_ttl_secs),
        ),
        config.auth.timestamp_tolerance_secs,
    ));

    // ── First-boot seed ──────────────────────────────────────────────
    if let Err(e) = seed_watchlist(&store, &steam, 100).await {
        tracing::warn!(error = %e, "watchlist seed failed, continuing with empty list");
    }

    // ── Scheduler ────────────────────────────────────────────────────
    let jobs_cfg = config.jobs.clone();
    let mut scheduler = Scheduler::new();
    let interval = Duration::from_secs;
    scheduler.spawn(JobSpec {
        job: Arc::new(SampleJob::new(store.clone(), steam.clone(), jobs_cfg.clone())),
        interval: interval(jobs_cfg.sample_interval_secs),
        initial_delay: interval(jobs_cfg.sample_interval_secs),
    });
    scheduler.spawn(JobSpec {
        job: Arc::new(RefreshJob::new(store.clone(), steam.clone(), jobs_cfg.clone())),
        interval: interval(jobs_cfg.refresh_interval_secs),
        initial_delay: Duration::ZERO,
    });
    scheduler.spawn(JobSpec {
        job: Arc::new(EnrichJob::new(store.clone(), steam.clone())),
        interval: interval(jobs_cfg.enrich_interval_secs),
        initial_delay: interval(jobs_cfg.enrich_initial_delay_secs),
    });
    scheduler.spawn(JobSpec {
        job: Arc::new(RollupHourlyJob::new(store.clone())),
        interval: interval(jobs_cfg.rollup_hourly_interval_secs),
        initial_delay: interval(jobs_cfg.rollup_hourly_interval_secs),
    });
    scheduler.spawn(JobSpec {
        job: Arc::new(RollupDailyJob::new(store.clone())),
        interval: interval(jobs_cfg.rollup_daily_interval_secs),
        initial_delay: interval(jobs_cfg.rollup_daily_interval_secs),
    });
    scheduler.spawn(JobSpec {
        job: Arc::new(PurgeHourlyJob::new(store.clone(), jobs_cfg.clone())),
        interval: interval(jobs_cfg.purge_interval_secs),
        initial_delay: interval(jobs_cfg.purge_interval_secs),
    });
    scheduler.spawn(JobSpec {
        job: Arc::new(PurgeDailyJob::new(store.clone(), jobs_cfg.clone())),
        interval: interval(jobs_cfg.purge_interval_secs),
        initial_delay: interval(jobs_cfg.purge_interval_secs),
    });
    tracing::info!("scheduler started");

    // ── App state + router ───────────────────────────────────────────
    let state = AppState {
        config: config.clone(),
        store: store.clone(),
        steam,
        deals,
        tokens: tokens.clone(),
        verifier,
        scheduler_running: scheduler.running_flag(),
    };

    // Per-caller rate limiting: client id when a valid token is
    // present, peer address otherwise.
    let governor_layer = config.server.rate_limit.as_ref().and_then(|rl| {
        use tower_governor::governor::GovernorConfigBuilder;
        use tower_governor::GovernorLayer;

        // Zero values are rejected at config load; if one slips
        // through, run without limiting instead of aborting.
        let Some(gov_config) = GovernorConfigBuilder::default()
            .per_second(rl.requests_per_second)
            .burst_size(rl.burst_size)
            .key_extractor(CallerKeyExtractor {
                tokens: tokens.clone(),
            })
            .finish()
        else {
            tracing::error!(
                requests_per_second = rl.requests_per_second,
                burst_size = rl.burst_size,
                "invalid rate-limit settings, per-caller rate limiting disabled"
            );
            return None;
        };

        tracing::info!(
            requests_per_second = rl.requests_per_second,
            burst_size = rl.burst_size,
            "per-caller rate limiting enabled"
        );
        Some(GovernorLayer {
            config: Arc::new(gov_config),
        })
    });

    let router = api::router(state.clone()).with_state(state);
    let app = match governor_layer {
        Some(gov) => router.layer(gov),
        None => router,
    };

    // ── Bind & serve ─────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    tracing::info!(addr = %addr, "steamboard listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("http server error")?;

    // ── Drain ────────────────────────────────────────────────────────
    tracing::info!("shutdown requested");
    scheduler
        .shutdown(Duration::from_secs(config.jobs.drain_secs))
        .await;
    store.close().await;
    tracing::info!("steamboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
