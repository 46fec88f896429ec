//! Runtime configuration for lmp-ap
//!
//! Each setting is taken from the command line (or its `LMP_*` environment
//! variable), then the TOML bootstrap file, then the built-in default.

use clap::Parser;
use lmp_common::config::{resolve_data_folder, resolve_database_path, TomlConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5730;

/// Default device status poll interval, in milliseconds
pub const DEFAULT_STATUS_POLL_INTERVAL_MS: u64 = 500;

/// Accepted poll interval range, in milliseconds
pub const STATUS_POLL_INTERVAL_RANGE_MS: (u64, u64) = (100, 5000);

/// Command-line arguments for lmp-ap
#[derive(Parser, Debug, Default)]
#[command(name = "lmp-ap")]
#[command(about = "Local media player: playback queue and auto-advance service")]
#[command(version)]
pub struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "LMP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "LMP_PORT")]
    pub port: Option<u16>,

    /// Folder holding the database
    #[arg(long, env = "LMP_DATA_FOLDER")]
    pub data_folder: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, env = "LMP_DATABASE")]
    pub database: Option<PathBuf>,

    /// Folder scanned for audio files
    #[arg(short, long, env = "LMP_MUSIC_FOLDER")]
    pub music_folder: Option<PathBuf>,

    /// Output device name
    #[arg(long, env = "LMP_AUDIO_DEVICE")]
    pub audio_device: Option<String>,

    /// Device status poll interval in milliseconds
    #[arg(long, env = "LMP_STATUS_POLL_MS")]
    pub status_poll_ms: Option<u64>,

    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_folder: PathBuf,
    pub database_path: PathBuf,
    pub music_folder: Option<PathBuf>,
    pub audio_device: Option<String>,
    pub status_poll_interval: Duration,
    pub log_level: String,
}

impl Config {
    /// Merge CLI arguments over the TOML file over defaults
    pub fn resolve(args: &Args, toml: &TomlConfig) -> Self {
        let data_folder = resolve_data_folder(args.data_folder.as_deref(), toml);
        let database_path = resolve_database_path(args.database.as_deref(), toml, &data_folder);

        let poll_ms = args
            .status_poll_ms
            .or(toml.status_poll_interval_ms)
            .unwrap_or(DEFAULT_STATUS_POLL_INTERVAL_MS);

        Self {
            port: args.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            data_folder,
            database_path,
            music_folder: args.music_folder.clone().or_else(|| toml.music_folder.clone()),
            audio_device: args.audio_device.clone().or_else(|| toml.audio_device.clone()),
            status_poll_interval: Duration::from_millis(clamp_poll_interval(poll_ms)),
            log_level: toml.logging.level.clone(),
        }
    }
}

/// Clamp a poll interval into [`STATUS_POLL_INTERVAL_RANGE_MS`]
pub fn clamp_poll_interval(ms: u64) -> u64 {
    let (min, max) = STATUS_POLL_INTERVAL_RANGE_MS;
    ms.clamp(min, max)
}
