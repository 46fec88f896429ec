//! Event types for the LMP event system
//!
//! Events are broadcast by the player and streamed to presentation layers
//! over SSE. Every variant carries a UTC timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::track::{LoopMode, Track};

/// Player state machine position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No resource loaded
    #[default]
    Idle,
    /// A resource is being swapped in
    Loading,
    /// Loaded and audible
    Playing,
    /// Loaded and paused by the user
    Paused,
    /// Stopped at the end of the track, awaiting the loop policy decision
    Finished,
}

impl PlaybackState {
    /// True when a resource is loaded on the output device
    pub fn is_loaded(&self) -> bool {
        matches!(
            self,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Finished
        )
    }
}

/// Why a track stopped being the current track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Played to the end
    Completed,
    /// Replaced by a user command
    Superseded,
}

/// LMP event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LmpEvent {
    /// Playback state changed
    PlaybackStateChanged {
        state: PlaybackState,
        timestamp: DateTime<Utc>,
    },

    /// A track was loaded and started
    TrackStarted {
        track: Track,
        index: usize,
        timestamp: DateTime<Utc>,
    },

    /// The current track stopped being current
    TrackFinished {
        track_id: String,
        reason: FinishReason,
        timestamp: DateTime<Utc>,
    },

    /// Playback position update (published on non-stale status samples)
    PlaybackPosition {
        track_id: String,
        position_seconds: f64,
        duration_seconds: f64,
        playing: bool,
        timestamp: DateTime<Utc>,
    },

    /// Queue contents or current index changed
    QueueChanged {
        length: usize,
        current_index: Option<usize>,
        timestamp: DateTime<Utc>,
    },

    /// Loop mode changed
    LoopModeChanged {
        mode: LoopMode,
        timestamp: DateTime<Utc>,
    },

    /// A playlist was created, modified or deleted
    PlaylistsChanged {
        playlist_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Favourite set changed
    FavouritesChanged {
        track_id: String,
        favourite: bool,
        timestamp: DateTime<Utc>,
    },
}

impl LmpEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            LmpEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            LmpEvent::TrackStarted { .. } => "TrackStarted",
            LmpEvent::TrackFinished { .. } => "TrackFinished",
            LmpEvent::PlaybackPosition { .. } => "PlaybackPosition",
            LmpEvent::QueueChanged { .. } => "QueueChanged",
            LmpEvent::LoopModeChanged { .. } => "LoopModeChanged",
            LmpEvent::PlaylistsChanged { .. } => "PlaylistsChanged",
            LmpEvent::FavouritesChanged { .. } => "FavouritesChanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = LmpEvent::LoopModeChanged {
            mode: LoopMode::All,
            timestamp: Utc::now(),
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "LoopModeChanged");
        assert_eq!(json["mode"], "all");
        assert_eq!(event.event_type(), "LoopModeChanged");
    }

    #[test]
    fn test_playback_state_loaded() {
        assert!(!PlaybackState::Idle.is_loaded());
        assert!(!PlaybackState::Loading.is_loaded());
        assert!(PlaybackState::Playing.is_loaded());
        assert!(PlaybackState::Paused.is_loaded());
        assert!(PlaybackState::Finished.is_loaded());
    }
}
