//! Process assembly for `valued serve` and `valued check`.
//!
//! Handles are built once here and passed down; nothing below this module
//! reaches for a global connection.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use valuegrid_api::{IntakeService, build_router};
use valuegrid_cache::{RedisCache, RedisChannel};
use valuegrid_core::ServiceConfig;
use valuegrid_startup::{RetryPolicy, StartupCoordinator, StartupReport};
use valuegrid_store::{BoundedStore, PgStore, RequestStore};

/// Gate on the store, then serve until a shutdown signal arrives.
pub async fn run_serve(config: ServiceConfig) -> anyhow::Result<()> {
    info!("valued starting");

    // ── Backing-service handles ────────────────────────────────

    let store = durable_store(&config);
    let cache = Arc::new(RedisCache::new(&config.cache).context("configuring cache")?);
    let channel =
        Arc::new(RedisChannel::new(&config.cache).context("configuring notification channel")?);

    // ── Startup gate ───────────────────────────────────────────

    run_gate(store.clone(), &config).await?;

    // ── API server ─────────────────────────────────────────────

    let service = IntakeService::new(store, cache, channel);
    let router = build_router(service.clone());

    let listener = tokio::net::TcpListener::bind(config.server.listen)
        .await
        .with_context(|| format!("binding {}", config.server.listen))?;
    info!(addr = %config.server.listen, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(in_flight = service.in_flight(), "draining side effects");
    service.drain().await;

    info!("valued stopped");
    Ok(())
}

/// Run only the startup gate.
pub async fn run_check(config: ServiceConfig) -> anyhow::Result<()> {
    let store = durable_store(&config);
    let report = run_gate(store, &config).await?;
    println!(
        "store ready after {} attempt(s) in {}ms",
        report.attempts,
        report.elapsed.as_millis()
    );
    Ok(())
}

/// PostgreSQL with every call bounded by the connect timeout.
fn durable_store(config: &ServiceConfig) -> Arc<BoundedStore<PgStore>> {
    let pg = PgStore::connect_lazy(&config.store);
    Arc::new(BoundedStore::new(pg, config.store.connect_timeout()))
}

async fn run_gate(
    store: Arc<dyn RequestStore>,
    config: &ServiceConfig,
) -> anyhow::Result<StartupReport> {
    let policy =
        RetryPolicy::from(&config.startup).with_attempt_timeout(config.store.connect_timeout());
    let gate = StartupCoordinator::new(store, policy);

    let policy = gate.policy();
    info!(
        attempts = policy.attempts,
        delay_ms = policy.delay.as_millis() as u64,
        attempt_timeout_ms = policy.attempt_timeout.as_millis() as u64,
        host = %config.store.host,
        port = config.store.port,
        "waiting for durable store"
    );
    gate.run().await.context("startup gate failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
