//! Queue / loop-mode session persistence
//!
//! Restoring never fails: a missing, unreadable or corrupt value is logged and
//! replaced by its default, so a damaged database only costs the saved session.

use super::{KeyValueStore, KEY_LOOP_MODE, KEY_QUEUE, KEY_QUEUE_CURRENT_ID};
use crate::error::{Error, Result};
use lmp_common::{LoopMode, Track};
use tracing::{debug, warn};

/// Saved player session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub tracks: Vec<Track>,
    /// Index into `tracks`; None only when `tracks` is empty
    pub current_index: Option<usize>,
    pub loop_mode: LoopMode,
}

/// Load the saved session, falling back to defaults value by value
pub async fn restore(store: &dyn KeyValueStore) -> Session {
    let tracks = match read_queue(store).await {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!("Discarding saved queue: {}", e);
            Vec::new()
        }
    };

    let current_id = match store.get(KEY_QUEUE_CURRENT_ID).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read saved current track: {}", e);
            None
        }
    };

    let current_index = if tracks.is_empty() {
        None
    } else {
        let found = current_id
            .as_deref()
            .and_then(|id| tracks.iter().position(|t| t.id == id));
        if found.is_none() {
            debug!("Saved current track not in queue, selecting first track");
        }
        Some(found.unwrap_or(0))
    };

    let loop_mode = match read_loop_mode(store).await {
        Ok(mode) => mode,
        Err(e) => {
            warn!("Discarding saved loop mode: {}", e);
            LoopMode::default()
        }
    };

    Session {
        tracks,
        current_index,
        loop_mode,
    }
}

async fn read_queue(store: &dyn KeyValueStore) -> Result<Vec<Track>> {
    match store.get(KEY_QUEUE).await? {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| Error::Persistence(format!("corrupt queue: {}", e))),
        None => Ok(Vec::new()),
    }
}

async fn read_loop_mode(store: &dyn KeyValueStore) -> Result<LoopMode> {
    match store.get(KEY_LOOP_MODE).await? {
        Some(value) => value
            .parse()
            .map_err(|e: lmp_common::Error| Error::Persistence(e.to_string())),
        None => Ok(LoopMode::default()),
    }
}

/// Save the queue contents
pub async fn save_queue(store: &dyn KeyValueStore, tracks: &[Track]) -> Result<()> {
    let json = serde_json::to_string(tracks)
        .map_err(|e| Error::Persistence(format!("failed to encode queue: {}", e)))?;
    store.set(KEY_QUEUE, &json).await
}

/// Save the id of the current track (empty string when nothing is selected)
pub async fn save_current(store: &dyn KeyValueStore, track: Option<&Track>) -> Result<()> {
    let id = track.map(|t| t.id.as_str()).unwrap_or("");
    store.set(KEY_QUEUE_CURRENT_ID, id).await
}

pub async fn save_loop_mode(store: &dyn KeyValueStore, mode: LoopMode) -> Result<()> {
    store.set(KEY_LOOP_MODE, mode.as_str()).await
}
