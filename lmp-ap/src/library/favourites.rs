//! Favourite tracks

use crate::error::{Error, Result};
use crate::state::SharedState;
use crate::store::{KeyValueStore, KEY_FAVOURITES};
use chrono::Utc;
use lmp_common::events::LmpEvent;
use lmp_common::Track;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Favourite set, persisted under `favourites` after every change
pub struct Favourites {
    store: Arc<dyn KeyValueStore>,
    state: Arc<SharedState>,
    tracks: RwLock<Vec<Track>>,
}

impl Favourites {
    /// Load saved favourites; unreadable data starts an empty set
    pub async fn load(store: Arc<dyn KeyValueStore>, state: Arc<SharedState>) -> Self {
        let tracks: Vec<Track> = match store.get(KEY_FAVOURITES).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Discarding corrupt favourites: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read favourites: {}", e);
                Vec::new()
            }
        };

        Self {
            store,
            state,
            tracks: RwLock::new(tracks),
        }
    }

    pub async fn list(&self) -> Vec<Track> {
        self.tracks.read().await.clone()
    }

    pub async fn is_favourite(&self, track_id: &str) -> bool {
        self.tracks.read().await.iter().any(|t| t.id == track_id)
    }

    /// Add `track` if absent, remove it if present; returns the new membership
    ///
    /// Nothing changes when the store rejects the write.
    pub async fn toggle(&self, track: Track) -> Result<bool> {
        let mut tracks = self.tracks.write().await;
        let mut updated = tracks.clone();
        let track_id = track.id.clone();

        let favourite = match updated.iter().position(|t| t.id == track.id) {
            Some(pos) => {
                updated.remove(pos);
                false
            }
            None => {
                updated.push(track);
                true
            }
        };

        let json = serde_json::to_string(&updated)
            .map_err(|e| Error::Persistence(format!("failed to encode favourites: {}", e)))?;
        self.store.set(KEY_FAVOURITES, &json).await?;
        *tracks = updated;
        drop(tracks);

        info!(
            "{} favourites: {}",
            if favourite { "Added to" } else { "Removed from" },
            track_id
        );
        self.state.broadcast_event(LmpEvent::FavouritesChanged {
            track_id,
            favourite,
            timestamp: Utc::now(),
        });

        Ok(favourite)
    }
}
