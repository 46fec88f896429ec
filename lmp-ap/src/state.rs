//! Shared player state
//!
//! Read model published by the playback controller. The controller task is
//! the only writer; HTTP handlers and SSE subscribers only read.

use lmp_common::events::LmpEvent;
use lmp_common::{LoopMode, Track};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

pub use lmp_common::events::PlaybackState;

/// Observable player state
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerView {
    /// State machine position
    pub state: PlaybackState,
    /// Track at the queue pointer (None when nothing is selected)
    pub current_track: Option<Track>,
    /// Queue pointer
    pub current_index: Option<usize>,
    /// True while the device reports audio running
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub loop_mode: LoopMode,
    pub queue_length: usize,
}

/// Shared state accessible by all components
pub struct SharedState {
    /// Latest published player view
    pub player: RwLock<PlayerView>,

    /// Current queue contents
    pub queue: RwLock<Vec<Track>>,

    /// Event broadcaster for SSE events
    pub event_tx: broadcast::Sender<LmpEvent>,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100); // Buffer up to 100 events
        Self {
            player: RwLock::new(PlayerView::default()),
            queue: RwLock::new(Vec::new()),
            event_tx,
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: LmpEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<LmpEvent> {
        self.event_tx.subscribe()
    }

    /// Snapshot of the player view
    pub async fn get_view(&self) -> PlayerView {
        self.player.read().await.clone()
    }

    /// Mutate the player view in place
    pub async fn update_view<F>(&self, f: F)
    where
        F: FnOnce(&mut PlayerView),
    {
        let mut view = self.player.write().await;
        f(&mut view);
    }

    pub async fn get_queue(&self) -> Vec<Track> {
        self.queue.read().await.clone()
    }

    pub async fn set_queue(&self, tracks: Vec<Track>) {
        *self.queue.write().await = tracks;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_default_view_is_idle() {
        let state = SharedState::new();
        let view = state.get_view().await;

        assert_eq!(view.state, PlaybackState::Idle);
        assert!(view.current_track.is_none());
        assert_eq!(view.loop_mode, LoopMode::None);
        assert!(!view.is_playing);
    }

    #[tokio::test]
    async fn test_update_view() {
        let state = SharedState::new();
        state
            .update_view(|v| {
                v.state = PlaybackState::Playing;
                v.position_seconds = 12.0;
            })
            .await;

        let view = state.get_view().await;
        assert_eq!(view.state, PlaybackState::Playing);
        assert_eq!(view.position_seconds, 12.0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();

        state.broadcast_event(LmpEvent::LoopModeChanged {
            mode: LoopMode::All,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "LoopModeChanged");
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ok() {
        let state = SharedState::new();
        state.broadcast_event(LmpEvent::LoopModeChanged {
            mode: LoopMode::One,
            timestamp: Utc::now(),
        });
    }
}
