//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::library::{Favourites, Library, PlaylistManager};
use crate::playback::PlaybackController;
use crate::state::SharedState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub controller: PlaybackController,
    pub library: Arc<Library>,
    pub playlists: Arc<PlaylistManager>,
    pub favourites: Arc<Favourites>,
}

/// Build the router with every route attached
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Playback control
        .route("/playback/state", get(super::handlers::get_playback_state))
        .route("/playback/queue", get(super::handlers::get_queue))
        .route("/playback/play", post(super::handlers::play))
        .route("/playback/toggle", post(super::handlers::toggle_play_pause))
        .route("/playback/seek", post(super::handlers::seek))
        .route("/playback/next", post(super::handlers::skip_next))
        .route("/playback/previous", post(super::handlers::skip_previous))
        .route(
            "/playback/loop_mode",
            get(super::handlers::get_loop_mode).post(super::handlers::set_loop_mode),
        )
        .route(
            "/playback/loop_mode/toggle",
            post(super::handlers::toggle_loop_mode),
        )
        // Library
        .route("/library/tracks", get(super::handlers::list_tracks))
        .route("/library/tracks/:id", get(super::handlers::get_track))
        // Playlists
        .route(
            "/playlists",
            get(super::handlers::list_playlists).post(super::handlers::create_playlist),
        )
        .route(
            "/playlists/:id",
            get(super::handlers::get_playlist).delete(super::handlers::delete_playlist),
        )
        .route("/playlists/:id/tracks", post(super::handlers::add_to_playlist))
        .route(
            "/playlists/:id/tracks/:track_id",
            delete(super::handlers::remove_from_playlist),
        )
        // Favourites
        .route("/favourites", get(super::handlers::list_favourites))
        .route("/favourites/toggle", post(super::handlers::toggle_favourite))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Run HTTP API server until `shutdown` resolves
pub async fn run<F>(port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
