//! Configuration loading and data folder resolution
//!
//! Tests that touch LMP_DATA_FOLDER are marked #[serial] so they never run
//! alongside each other.

use lmp_common::config::{
    default_data_folder, find_config_file, resolve_data_folder, resolve_database_path,
    TomlConfig, DATA_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert!(config.port.is_none());
    assert_eq!(config.logging.level, "info");

    let config = TomlConfig::load_or_default(None).unwrap();
    assert!(config.database_path.is_none());
}

#[test]
fn test_config_file_is_parsed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
port = 6000
music_folder = "/srv/music"
status_poll_interval_ms = 250

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.port, Some(6000));
    assert_eq!(config.music_folder, Some(PathBuf::from("/srv/music")));
    assert_eq!(config.status_poll_interval_ms, Some(250));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    assert!(TomlConfig::load_or_default(Some(&path)).is_err());
}

#[test]
fn test_explicit_config_path_wins() {
    let explicit = Path::new("/tmp/lmp-explicit.toml");
    assert_eq!(find_config_file(Some(explicit)), Some(explicit.to_path_buf()));
}

#[test]
#[serial]
fn test_data_folder_cli_beats_env() {
    env::set_var(DATA_FOLDER_ENV, "/tmp/lmp-env");
    let resolved = resolve_data_folder(Some(Path::new("/tmp/lmp-cli")), &TomlConfig::default());
    env::remove_var(DATA_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/tmp/lmp-cli"));
}

#[test]
#[serial]
fn test_data_folder_env_beats_toml() {
    let toml = TomlConfig {
        data_folder: Some(PathBuf::from("/tmp/lmp-toml")),
        ..TomlConfig::default()
    };

    env::set_var(DATA_FOLDER_ENV, "/tmp/lmp-env");
    let resolved = resolve_data_folder(None, &toml);
    env::remove_var(DATA_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/tmp/lmp-env"));
}

#[test]
#[serial]
fn test_data_folder_falls_back_to_toml_then_default() {
    env::remove_var(DATA_FOLDER_ENV);

    let toml = TomlConfig {
        data_folder: Some(PathBuf::from("/tmp/lmp-toml")),
        ..TomlConfig::default()
    };
    assert_eq!(resolve_data_folder(None, &toml), PathBuf::from("/tmp/lmp-toml"));
    assert_eq!(
        resolve_data_folder(None, &TomlConfig::default()),
        default_data_folder()
    );
}

#[test]
fn test_database_path_resolution() {
    let data = Path::new("/var/lib/lmp");
    let toml = TomlConfig::default();

    assert_eq!(
        resolve_database_path(None, &toml, data),
        PathBuf::from("/var/lib/lmp/lmp.db")
    );
    assert_eq!(
        resolve_database_path(Some(Path::new("other.db")), &toml, data),
        PathBuf::from("/var/lib/lmp/other.db")
    );
    assert_eq!(
        resolve_database_path(Some(Path::new("/abs/player.db")), &toml, data),
        PathBuf::from("/abs/player.db")
    );

    let toml = TomlConfig {
        database_path: Some(PathBuf::from("from_toml.db")),
        ..TomlConfig::default()
    };
    assert_eq!(
        resolve_database_path(None, &toml, data),
        PathBuf::from("/var/lib/lmp/from_toml.db")
    );
}
