//! # LMP Audio Player Library (lmp-ap)
//!
//! Playback queue and auto-advance engine for a personal media player.
//!
//! **Purpose:** Own the play queue and loop mode, drive an audio output
//! device, detect the end of each track exactly once and pick what plays
//! next, and expose the whole thing over HTTP/SSE.
//!
//! **Architecture:** a single controller task ([`playback::PlaybackController`])
//! serializes user commands and device status polling; the cpal-backed
//! [`audio::DeviceOutput`] decodes with symphonia and resamples with rubato.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod library;
pub mod playback;
pub mod state;
pub mod store;

pub use error::{Error, Result};
pub use state::SharedState;
