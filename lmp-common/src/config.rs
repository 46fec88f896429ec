//! Configuration loading and data folder resolution
//!
//! Bootstrap configuration comes from a small TOML file. Missing files are
//! not fatal: a warning is logged and compiled defaults are used.
//!
//! Data folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LMP_DATA_FOLDER`)
//! 3. TOML config file (`data_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the data folder
pub const DATA_FOLDER_ENV: &str = "LMP_DATA_FOLDER";

/// Bootstrap configuration loaded from TOML
///
/// Cannot change while running; restart to pick up edits.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Folder holding the database (and anything else the player writes)
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    /// SQLite database path; relative paths are resolved against the data folder
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Folder scanned for audio files at startup
    #[serde(default)]
    pub music_folder: Option<PathBuf>,

    /// Output device name (default device when absent)
    #[serde(default)]
    pub audio_device: Option<String>,

    /// Interval between device status samples, in milliseconds
    #[serde(default)]
    pub status_poll_interval_ms: Option<u64>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level / filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))
    }

    /// Load a config file, degrading to defaults when it is missing
    ///
    /// A file that exists but fails to parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            warn!("No config file found, using built-in defaults");
            return Ok(Self::default());
        };

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_toml_str(&content)?;
                info!("Loaded config file: {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using built-in defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Locate the config file
///
/// An explicit path wins; otherwise `~/.config/lmp/config.toml`, then
/// `/etc/lmp/config.toml` on Linux. Returns None when nothing exists.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let user_config = dirs::config_dir().map(|d| d.join("lmp").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/lmp/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lmp"))
        .unwrap_or_else(|| PathBuf::from("./lmp_data"))
}

/// Resolve the data folder following the priority order in the module docs
pub fn resolve_data_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml.data_folder {
        return path.clone();
    }

    default_data_folder()
}

/// Resolve the database path: CLI, then TOML, then `<data_folder>/lmp.db`
///
/// Relative paths are joined onto the data folder.
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    toml: &TomlConfig,
    data_folder: &Path,
) -> PathBuf {
    let path = cli_arg
        .map(Path::to_path_buf)
        .or_else(|| toml.database_path.clone())
        .unwrap_or_else(|| PathBuf::from("lmp.db"));

    if path.is_absolute() {
        path
    } else {
        data_folder.join(path)
    }
}
