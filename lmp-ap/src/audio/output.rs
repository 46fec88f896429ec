//! Audio output device abstraction
//!
//! The playback controller is the only component that talks to an
//! [`AudioOutput`]. Status is pulled with [`AudioOutput::status`] on a fixed
//! interval by the controller task, so every snapshot is processed on the
//! same control flow as user commands.

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// One status sample from the output device
///
/// Plain `Copy` value: consumers get their own copy per poll tick and never
/// observe a half-updated snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackStatus {
    /// Current position in seconds (>= 0)
    pub position_seconds: f64,
    /// Total duration in seconds (0 when unknown)
    pub duration_seconds: f64,
    /// True while audio is being rendered
    pub is_playing: bool,
}

impl PlaybackStatus {
    /// Build a snapshot, clamping negative or non-finite times to zero
    pub fn new(position_seconds: f64, duration_seconds: f64, is_playing: bool) -> Self {
        Self {
            position_seconds: non_negative(position_seconds),
            duration_seconds: non_negative(duration_seconds),
            is_playing,
        }
    }
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self::new(0.0, 0.0, false)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Output device driven by the playback controller
///
/// `load` replaces the current resource and leaves it paused at position 0;
/// `play` must be called to start it. Implementations report failures
/// through the returned `Result`; the controller logs them and never retries.
#[async_trait]
pub trait AudioOutput: Send + 'static {
    /// Load the resource at `uri`, replacing any current one
    ///
    /// Fails with [`crate::Error::Resource`] when the URI cannot be read or decoded.
    async fn load(&mut self, uri: &str) -> Result<()>;

    /// Start or resume the loaded resource
    fn play(&mut self) -> Result<()>;

    /// Pause the loaded resource
    fn pause(&mut self) -> Result<()>;

    /// Move the play head; positions past the end are the device's concern
    async fn seek(&mut self, seconds: f64) -> Result<()>;

    /// Current status, or None when nothing is loaded
    fn status(&self) -> Option<PlaybackStatus>;
}
