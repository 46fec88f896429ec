//! Scripted output device
//!
//! Records every command the controller issues and reports whatever status
//! the test sets. Clones share state, so a test keeps one clone and hands
//! another to the controller.

use async_trait::async_trait;
use lmp_ap::audio::{AudioOutput, PlaybackStatus};
use lmp_ap::{Error, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Default duration of every loaded resource, in seconds
pub const MOCK_DURATION_SECONDS: f64 = 180.0;

/// One command received by the device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Load(String),
    Play,
    Pause,
    Seek(f64),
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<DeviceCall>,
    loaded: Option<String>,
    position: f64,
    duration: f64,
    playing: bool,
    failing_uris: HashSet<String>,
    load_delay: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct MockOutput {
    inner: Arc<Mutex<MockState>>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap()
    }

    /// Every command received so far
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.lock().calls.clone()
    }

    /// URIs passed to `load`, in order (including rejected ones)
    pub fn loads(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Load(uri) => Some(uri.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make `load(uri)` fail with a resource error
    pub fn fail_uri(&self, uri: &str) {
        self.lock().failing_uris.insert(uri.to_string());
    }

    /// Make every load take `delay` (virtual time under `start_paused`)
    pub fn set_load_delay(&self, delay: Duration) {
        self.lock().load_delay = Some(delay);
    }

    pub fn loaded_uri(&self) -> Option<String> {
        self.lock().loaded.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn set_position(&self, seconds: f64) {
        self.lock().position = seconds;
    }

    /// Stop at the end of the loaded resource, as a real device does
    pub fn finish_track(&self) {
        let mut state = self.lock();
        state.position = state.duration;
        state.playing = false;
    }
}

#[async_trait]
impl AudioOutput for MockOutput {
    async fn load(&mut self, uri: &str) -> Result<()> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(DeviceCall::Load(uri.to_string()));
            if state.failing_uris.contains(uri) {
                return Err(Error::Resource(format!("cannot open {}", uri)));
            }
            state.load_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        state.loaded = Some(uri.to_string());
        state.position = 0.0;
        state.duration = MOCK_DURATION_SECONDS;
        state.playing = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(DeviceCall::Play);
        if state.loaded.is_none() {
            return Err(Error::AudioOutput("nothing loaded".to_string()));
        }
        // Nothing left to render once stopped at the end
        state.playing = state.position < state.duration;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(DeviceCall::Pause);
        state.playing = false;
        Ok(())
    }

    async fn seek(&mut self, seconds: f64) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(DeviceCall::Seek(seconds));
        state.position = seconds;
        Ok(())
    }

    fn status(&self) -> Option<PlaybackStatus> {
        let state = self.lock();
        state.loaded.as_ref()?;
        Some(PlaybackStatus::new(
            state.position,
            state.duration,
            state.playing,
        ))
    }
}
