//! Playlist management
//!
//! Playlists are kept in memory and written back to the store as one JSON
//! array on every mutation. The in-memory list only changes once the write
//! succeeds. With nothing stored (or unreadable data) the
//! built-in "My Favorites" and "Recently Added" playlists are used.

use crate::error::{Error, Result};
use crate::state::SharedState;
use crate::store::{KeyValueStore, KEY_PLAYLISTS};
use chrono::{TimeZone, Utc};
use lmp_common::events::LmpEvent;
use lmp_common::{Playlist, Track};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Playlists present on first start
pub fn default_playlists() -> Vec<Playlist> {
    let created = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);

    vec![
        Playlist::new("1", "My Favorites", created),
        Playlist::new("2", "Recently Added", created),
    ]
}

/// Playlist CRUD backed by a [`KeyValueStore`]
pub struct PlaylistManager {
    store: Arc<dyn KeyValueStore>,
    state: Arc<SharedState>,
    playlists: RwLock<Vec<Playlist>>,
}

impl PlaylistManager {
    /// Load saved playlists, falling back to [`default_playlists`]
    pub async fn load(store: Arc<dyn KeyValueStore>, state: Arc<SharedState>) -> Self {
        let playlists = match store.get(KEY_PLAYLISTS).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Playlist>>(&json) {
                Ok(playlists) => playlists,
                Err(e) => {
                    warn!("Discarding corrupt playlists, using defaults: {}", e);
                    default_playlists()
                }
            },
            Ok(None) => default_playlists(),
            Err(e) => {
                warn!("Failed to read playlists, using defaults: {}", e);
                default_playlists()
            }
        };

        debug!("Loaded {} playlists", playlists.len());

        Self {
            store,
            state,
            playlists: RwLock::new(playlists),
        }
    }

    pub async fn list(&self) -> Vec<Playlist> {
        self.playlists.read().await.clone()
    }

    pub async fn get_playlist_by_id(&self, id: &str) -> Option<Playlist> {
        self.playlists.read().await.iter().find(|p| p.id == id).cloned()
    }

    /// Create an empty playlist with a fresh id
    pub async fn create_playlist(&self, name: &str) -> Result<Playlist> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::BadRequest("Playlist name must not be empty".to_string()));
        }

        let playlist = Playlist::new(Uuid::new_v4().to_string(), name, Utc::now());

        let mut playlists = self.playlists.write().await;
        let mut updated = playlists.clone();
        updated.push(playlist.clone());
        self.persist(&updated).await?;
        *playlists = updated;
        drop(playlists);

        info!("Created playlist {} ({})", playlist.name, playlist.id);
        self.notify(&playlist.id);
        Ok(playlist)
    }

    /// Append `track`; returns false when it was already present
    pub async fn add_to_playlist(&self, id: &str, track: Track) -> Result<bool> {
        let mut playlists = self.playlists.write().await;
        let mut updated = playlists.clone();
        let playlist = find_mut(&mut updated, id)?;

        if playlist.contains(&track.id) {
            debug!("Track {} already in playlist {}", track.id, id);
            return Ok(false);
        }

        playlist.tracks.push(track);
        self.persist(&updated).await?;
        *playlists = updated;
        drop(playlists);

        self.notify(id);
        Ok(true)
    }

    /// Remove the track with `track_id`; returns false when it was not present
    pub async fn remove_from_playlist(&self, id: &str, track_id: &str) -> Result<bool> {
        let mut playlists = self.playlists.write().await;
        let mut updated = playlists.clone();
        let playlist = find_mut(&mut updated, id)?;

        let before = playlist.tracks.len();
        playlist.tracks.retain(|t| t.id != track_id);
        if playlist.tracks.len() == before {
            return Ok(false);
        }

        self.persist(&updated).await?;
        *playlists = updated;
        drop(playlists);

        self.notify(id);
        Ok(true)
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<()> {
        let mut playlists = self.playlists.write().await;
        let updated: Vec<Playlist> = playlists.iter().filter(|p| p.id != id).cloned().collect();
        if updated.len() == playlists.len() {
            return Err(Error::NotFound(format!("Playlist {}", id)));
        }

        self.persist(&updated).await?;
        *playlists = updated;
        drop(playlists);

        info!("Deleted playlist {}", id);
        self.notify(id);
        Ok(())
    }

    async fn persist(&self, playlists: &[Playlist]) -> Result<()> {
        let json = serde_json::to_string(playlists)
            .map_err(|e| Error::Persistence(format!("failed to encode playlists: {}", e)))?;
        self.store.set(KEY_PLAYLISTS, &json).await
    }

    fn notify(&self, playlist_id: &str) {
        self.state.broadcast_event(LmpEvent::PlaylistsChanged {
            playlist_id: playlist_id.to_string(),
            timestamp: Utc::now(),
        });
    }
}

fn find_mut<'a>(playlists: &'a mut [Playlist], id: &str) -> Result<&'a mut Playlist> {
    playlists
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| Error::NotFound(format!("Playlist {}", id)))
}
