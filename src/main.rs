//! Tollgate Server: prepaid hour-metered license gating service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use tollgate_core::config::AppConfig;
use tollgate_core::error::AppError;
use tollgate_database::repositories::{
    Ledger, LicenseStore, PgLedger, PgLicenseStore, PgSessionStore, SessionStore,
};
use tollgate_service::{AccessGate, LicenseService, PaymentProcessor, SessionTracker};
use tollgate_worker::{StaleSessionReaper, WorkerRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("TOLLGATE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Tollgate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db_pool = tollgate_database::connection::create_pool(&config.database).await?;

    tracing::info!("Running database migrations...");
    tollgate_database::migration::run_migrations(&db_pool).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: Stores ───────────────────────────────────────────
    let licenses: Arc<dyn LicenseStore> = Arc::new(PgLicenseStore::new(db_pool.clone()));
    let ledger: Arc<dyn Ledger> = Arc::new(PgLedger::new(db_pool.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(db_pool.clone()));

    // ── Step 3: Services ─────────────────────────────────────────
    let gate = Arc::new(AccessGate::new(
        Arc::clone(&licenses),
        Arc::clone(&ledger),
        &config.gate,
    ));
    let tracker = Arc::new(SessionTracker::new(
        Arc::clone(&sessions),
        Arc::clone(&ledger),
        Arc::clone(&gate),
        config.session.clone(),
    ));
    let payments = Arc::new(PaymentProcessor::new(
        Arc::clone(&licenses),
        Arc::clone(&ledger),
        config.payment.clone(),
    ));
    let license_service = Arc::new(LicenseService::new(
        Arc::clone(&licenses),
        Arc::clone(&ledger),
    ));

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Background reaper ────────────────────────────────
    let worker_handle = if config.worker.enabled {
        let reaper = StaleSessionReaper::new(Arc::clone(&tracker));
        let runner = WorkerRunner::new(reaper, config.session.reap_interval_seconds);

        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(worker_cancel).await;
        });

        tracing::info!("Session reaper started");
        Some(handle)
    } else {
        tracing::info!("Session reaper disabled");
        None
    };

    // ── Step 6: Build and start HTTP server ──────────────────────
    let app_state = tollgate_api::state::AppState {
        config: Arc::new(config.clone()),
        licenses,
        ledger,
        sessions,
        gate,
        tracker,
        payments,
        license_service,
    };

    let app = tollgate_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Tollgate server listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 8: Wait for background tasks ────────────────────────
    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(
            std::time::Duration::from_secs(config.server.shutdown_grace_seconds),
            handle,
        )
        .await;
    }

    tracing::info!("Tollgate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
