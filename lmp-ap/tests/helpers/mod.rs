//! Test helper modules for LMP Audio Player integration tests
//!
//! - MockOutput: scripted output device recording every command
//! - TestServer: router + controller over a mock device and in-memory store

#![allow(dead_code)]

pub mod mock_output;
pub mod test_server;

pub use mock_output::{DeviceCall, MockOutput, MOCK_DURATION_SECONDS};
pub use test_server::TestServer;

use lmp_ap::playback::{ControllerConfig, PlaybackController};
use lmp_ap::store::{KeyValueStore, MemoryStore};
use lmp_ap::SharedState;
use lmp_common::Track;
use std::sync::Arc;
use std::time::Duration;

/// Poll interval used by every test controller
pub const POLL: Duration = Duration::from_millis(500);

pub fn track(id: &str) -> Track {
    Track::new(
        id,
        format!("Title {}", id),
        "Test Artist",
        format!("file:///music/{}.mp3", id),
    )
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

pub fn uri(id: &str) -> String {
    format!("file:///music/{}.mp3", id)
}

/// Controller over `output` with a fresh in-memory store
pub async fn spawn_controller(output: &MockOutput) -> PlaybackController {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    spawn_with_store(output, store).await
}

/// Controller over `output` restoring from (and saving to) `store`
pub async fn spawn_with_store(
    output: &MockOutput,
    store: Arc<dyn KeyValueStore>,
) -> PlaybackController {
    PlaybackController::spawn(
        Box::new(output.clone()),
        store,
        Arc::new(SharedState::new()),
        ControllerConfig {
            status_poll_interval: POLL,
        },
    )
    .await
}

/// Let one status poll happen (virtual time under `start_paused`)
pub async fn next_poll() {
    tokio::time::sleep(POLL + Duration::from_millis(50)).await;
}
