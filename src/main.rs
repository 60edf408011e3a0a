//! Voxel Guard host - runs the anti-cheat core outside the game process
//!
//! This binary:
//! - Loads thresholds and host settings from the environment
//! - Runs periodic violation decay and stale-state eviction
//! - Serves the admin WebSocket bridge and a health endpoint

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voxel_guard::admin::build_router;
use voxel_guard::app::AppState;
use voxel_guard::config::Config;
use voxel_guard::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Voxel Guard");
    info!("Admin address: {}", config.admin_addr);
    if let Some(path) = &config.anticheat_config_path {
        info!("Thresholds loaded from {}", path.display());
    }

    // Create application state
    let state = AppState::new(config.clone());

    // Spawn maintenance loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let maintenance = tokio::spawn(run_maintenance(
        state.clone(),
        Duration::from_millis(config.maintenance_tick_ms.max(1)),
        shutdown_rx,
    ));

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.admin_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Admin bridge listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Admin WebSocket endpoint: ws://{}/ws/admin", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    maintenance.await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Ask the core for maintenance every tick; the sweep itself is interval-gated
async fn run_maintenance(state: AppState, tick: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if state.anticheat.perform_maintenance() {
                    let tracked = state.anticheat.tracked_players();
                    debug!(
                        action_players = tracked.actions,
                        movement_players = tracked.movement,
                        "Maintenance sweep complete"
                    );
                }
            }
            _ = shutdown.changed() => {
                info!("Maintenance loop stopped");
                break;
            }
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
