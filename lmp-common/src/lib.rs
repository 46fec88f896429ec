//! # LMP Common Library
//!
//! Shared code for the LMP player crates:
//! - Track, playlist and loop-mode value types
//! - Event types (LmpEvent enum) streamed to presentation layers
//! - Configuration file and data folder resolution
//! - Database bootstrap (settings key-value table)

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod track;

pub use error::{Error, Result};
pub use track::{LoopMode, Playlist, Track};
