//! LMP Audio Player (lmp-ap) - Main entry point
//!
//! Resolves configuration, opens the database and output device, restores the
//! saved session and serves the HTTP control API until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lmp_ap::api::{self, AppContext};
use lmp_ap::audio::DeviceOutput;
use lmp_ap::config::{Args, Config};
use lmp_ap::library::{Favourites, Library, PlaylistManager};
use lmp_ap::playback::{ControllerConfig, PlaybackController};
use lmp_ap::store::{KeyValueStore, SqliteStore};
use lmp_ap::SharedState;
use lmp_common::config::{find_config_file, TomlConfig};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = find_config_file(args.config.as_deref());
    let toml_config =
        TomlConfig::load_or_default(config_path.as_deref()).context("Failed to load config file")?;

    // Initialize tracing
    let default_filter = format!("lmp_ap={},tower_http=debug", toml_config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.list_devices {
        for name in DeviceOutput::list_devices().context("Failed to list audio devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = Config::resolve(&args, &toml_config);

    info!("Starting LMP Audio Player on port {}", config.port);
    info!("Database: {}", config.database_path.display());

    let db_pool = lmp_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(db_pool));

    let library = match &config.music_folder {
        Some(folder) => match Library::scan(folder).await {
            Ok(library) => library,
            Err(e) => {
                warn!("Music folder scan failed, library is empty: {}", e);
                Library::default()
            }
        },
        None => {
            info!("No music folder configured, library is empty");
            Library::default()
        }
    };

    let output =
        DeviceOutput::open(config.audio_device.as_deref()).context("Failed to open audio output")?;

    let state = Arc::new(SharedState::new());

    let controller = PlaybackController::spawn(
        Box::new(output),
        Arc::clone(&store),
        Arc::clone(&state),
        ControllerConfig {
            status_poll_interval: config.status_poll_interval,
        },
    )
    .await;

    let playlists = PlaylistManager::load(Arc::clone(&store), Arc::clone(&state)).await;
    let favourites = Favourites::load(Arc::clone(&store), Arc::clone(&state)).await;

    let ctx = AppContext {
        state,
        controller: controller.clone(),
        library: Arc::new(library),
        playlists: Arc::new(playlists),
        favourites: Arc::new(favourites),
    };

    api::run(config.port, ctx, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    controller.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
