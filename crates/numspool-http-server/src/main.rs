#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use numspool::GenerationEngine;
use server::config::{CliArgs, Command, ServerConfig};
use server::routes::{self, AppState};
use server::store::SegmentStore;
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let command = args.command.clone();
    let config = ServerConfig::try_from(args)?;

    init_telemetry();

    match command {
        Some(Command::Import { force }) => {
            let store = SegmentStore::open(&config.database)?;
            let stats = server::import::import_csv(&store, &config.csv, force)?;
            tracing::info!(
                inserted = stats.inserted,
                skipped = stats.skipped,
                "import finished"
            );
            Ok(())
        }
        None => serve(config).await,
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.spool_dir)?;

    let store = SegmentStore::open(&config.database)?;
    bootstrap_store(&store, &config).await?;

    let engine = GenerationEngine::new(config.engine.clone());

    let sweeper = tokio::spawn(server::retention::run(
        config.spool_dir.clone(),
        config.engine.artifact_expiry(),
        config.sweep_interval,
        engine.shutdown_token().clone(),
    ));

    let state = AppState::new(engine.clone(), store, config.clone());
    let app = routes::router(state);

    let listener = TcpListener::bind(&config.addr).await?;
    log_startup_info(&config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Draining the pool also cancels the sweeper's token.
    if let Err(e) = engine.shutdown().await {
        tracing::error!("error during engine shutdown: {e:?}");
    }
    let _ = sweeper.await;

    tracing::info!("service shut down successfully");
    Ok(())
}

/// Imports the configured CSV at startup when the lookup table is empty, so
/// a fresh deployment only needs the data file in place.
async fn bootstrap_store(store: &SegmentStore, config: &ServerConfig) -> anyhow::Result<()> {
    if store.count()? > 0 || !config.csv.exists() {
        return Ok(());
    }

    tracing::info!(csv = %config.csv.display(), "lookup table empty, importing segment data");
    let store = store.clone();
    let csv = config.csv.clone();
    let stats = tokio::task::spawn_blocking(move || server::import::import_csv(&store, &csv, false))
        .await??;
    tracing::info!(
        inserted = stats.inserted,
        skipped = stats.skipped,
        "segment data imported"
    );
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "starting numspool service on {} with full config: {:#?}",
            config.addr,
            config
        );
    } else {
        tracing::info!(
            "starting numspool service on {} with {} workers",
            config.addr,
            config.engine.num_workers
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("received SIGTERM signal");
        },
    }

    tracing::info!("shutdown signal received, terminating gracefully...");
}
