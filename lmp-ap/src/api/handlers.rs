//! HTTP request handlers
//!
//! Playback commands return the player view as it stands once the controller
//! has applied them. Device failures never surface here: the controller logs
//! them and the view simply does not change.

use crate::api::server::AppContext;
use crate::error::Error;
use crate::state::PlayerView;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use lmp_common::{LoopMode, Playlist, Track};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueueResponse {
    pub tracks: Vec<Track>,
    pub current_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub track: Track,
    /// New queue; omitted or empty keeps the current one
    #[serde(default)]
    pub queue: Option<Vec<Track>>,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub seconds: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoopModeBody {
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub track: Track,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistUpdateResponse {
    pub playlist_id: String,
    pub changed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavouriteResponse {
    pub track_id: String,
    pub favourite: bool,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn api_error(err: Error) -> ApiError {
    let code = match &err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) | Error::InvalidIndex { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if code.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected: {}", err);
    }

    (
        code,
        Json(StatusResponse {
            status: format!("error: {}", err),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "audio_player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /playback/state - Observable player state
pub async fn get_playback_state(State(ctx): State<AppContext>) -> Json<PlayerView> {
    Json(ctx.state.get_view().await)
}

/// GET /playback/queue - Queue contents and pointer
pub async fn get_queue(State(ctx): State<AppContext>) -> Json<QueueResponse> {
    let tracks = ctx.state.get_queue().await;
    let current_index = ctx.state.get_view().await.current_index;
    Json(QueueResponse {
        tracks,
        current_index,
    })
}

/// POST /playback/play - Play a track, optionally with a new queue
pub async fn play(
    State(ctx): State<AppContext>,
    Json(req): Json<PlayRequest>,
) -> Json<PlayerView> {
    info!("Play request: {}", req.track.id);
    ctx.controller.play_track(req.track, req.queue).await;
    Json(ctx.controller.view().await)
}

/// POST /playback/toggle - Pause or resume
pub async fn toggle_play_pause(State(ctx): State<AppContext>) -> Json<PlayerView> {
    ctx.controller.toggle_play_pause().await;
    Json(ctx.controller.view().await)
}

/// POST /playback/seek - Seek the current track
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> Json<PlayerView> {
    ctx.controller.seek(req.seconds).await;
    Json(ctx.controller.view().await)
}

/// POST /playback/next - Skip forward
pub async fn skip_next(State(ctx): State<AppContext>) -> Json<PlayerView> {
    ctx.controller.next().await;
    Json(ctx.controller.view().await)
}

/// POST /playback/previous - Skip back or restart
pub async fn skip_previous(State(ctx): State<AppContext>) -> Json<PlayerView> {
    ctx.controller.previous().await;
    Json(ctx.controller.view().await)
}

/// GET /playback/loop_mode
pub async fn get_loop_mode(State(ctx): State<AppContext>) -> Json<LoopModeBody> {
    let mode = ctx.state.get_view().await.loop_mode;
    Json(LoopModeBody {
        mode: mode.to_string(),
    })
}

/// POST /playback/loop_mode - Set loop mode (`none`, `one` or `all`)
pub async fn set_loop_mode(
    State(ctx): State<AppContext>,
    Json(req): Json<LoopModeBody>,
) -> Result<Json<LoopModeBody>, ApiError> {
    let mode: LoopMode = req.mode.parse().map_err(|e| api_error(Error::from(e)))?;
    ctx.controller.set_loop_mode(mode).await;
    Ok(Json(LoopModeBody {
        mode: mode.to_string(),
    }))
}

/// POST /playback/loop_mode/toggle - Cycle none -> one -> all
pub async fn toggle_loop_mode(State(ctx): State<AppContext>) -> Json<LoopModeBody> {
    let mode = ctx.controller.toggle_loop_mode().await;
    Json(LoopModeBody {
        mode: mode.to_string(),
    })
}

// ============================================================================
// Library Endpoints
// ============================================================================

/// GET /library/tracks?q= - List or search library tracks
pub async fn list_tracks(
    State(ctx): State<AppContext>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Track>> {
    let q = query.q.unwrap_or_default();
    Json(ctx.library.search(&q).await)
}

/// GET /library/tracks/:id
pub async fn get_track(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Track>, ApiError> {
    ctx.library
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| api_error(Error::NotFound(format!("Track {}", id))))
}

// ============================================================================
// Playlist Endpoints
// ============================================================================

/// GET /playlists
pub async fn list_playlists(State(ctx): State<AppContext>) -> Json<Vec<Playlist>> {
    Json(ctx.playlists.list().await)
}

/// POST /playlists - Create an empty playlist
pub async fn create_playlist(
    State(ctx): State<AppContext>,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<Playlist>), ApiError> {
    let playlist = ctx
        .playlists
        .create_playlist(&req.name)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// GET /playlists/:id
pub async fn get_playlist(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Playlist>, ApiError> {
    ctx.playlists
        .get_playlist_by_id(&id)
        .await
        .map(Json)
        .ok_or_else(|| api_error(Error::NotFound(format!("Playlist {}", id))))
}

/// DELETE /playlists/:id
pub async fn delete_playlist(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    ctx.playlists.delete_playlist(&id).await.map_err(api_error)?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

/// POST /playlists/:id/tracks - Add a track (duplicates ignored)
pub async fn add_to_playlist(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<TrackRequest>,
) -> Result<Json<PlaylistUpdateResponse>, ApiError> {
    let changed = ctx
        .playlists
        .add_to_playlist(&id, req.track)
        .await
        .map_err(api_error)?;
    Ok(Json(PlaylistUpdateResponse {
        playlist_id: id,
        changed,
    }))
}

/// DELETE /playlists/:id/tracks/:track_id
pub async fn remove_from_playlist(
    State(ctx): State<AppContext>,
    Path((id, track_id)): Path<(String, String)>,
) -> Result<Json<PlaylistUpdateResponse>, ApiError> {
    let changed = ctx
        .playlists
        .remove_from_playlist(&id, &track_id)
        .await
        .map_err(api_error)?;
    Ok(Json(PlaylistUpdateResponse {
        playlist_id: id,
        changed,
    }))
}

// ============================================================================
// Favourite Endpoints
// ============================================================================

/// GET /favourites
pub async fn list_favourites(State(ctx): State<AppContext>) -> Json<Vec<Track>> {
    Json(ctx.favourites.list().await)
}

/// POST /favourites/toggle
pub async fn toggle_favourite(
    State(ctx): State<AppContext>,
    Json(req): Json<TrackRequest>,
) -> Result<Json<FavouriteResponse>, ApiError> {
    let track_id = req.track.id.clone();
    let favourite = ctx
        .favourites
        .toggle(req.track)
        .await
        .map_err(api_error)?;
    Ok(Json(FavouriteResponse {
        track_id,
        favourite,
    }))
}
