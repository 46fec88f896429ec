//! Test server wrapper for API tests
//!
//! Builds the real router over a mock output device, an in-memory SQLite
//! store and a small fixed library.

use super::{spawn_with_store, tracks, MockOutput};
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use lmp_ap::api::{build_router, AppContext};
use lmp_ap::library::{Favourites, Library, PlaylistManager};
use lmp_ap::store::{KeyValueStore, SqliteStore};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestServer {
    pub router: Router,
    pub output: MockOutput,
    pub ctx: AppContext,
}

impl TestServer {
    /// Start a server whose library holds tracks `a`, `b` and `c`
    pub async fn start() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        lmp_common::db::create_settings_table(&pool).await.unwrap();
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(pool));

        let output = MockOutput::new();
        let controller = spawn_with_store(&output, Arc::clone(&store)).await;
        let state = Arc::clone(controller.shared_state());

        let playlists = PlaylistManager::load(Arc::clone(&store), Arc::clone(&state)).await;
        let favourites = Favourites::load(Arc::clone(&store), Arc::clone(&state)).await;

        let ctx = AppContext {
            state,
            controller,
            library: Arc::new(Library::new(tracks(&["a", "b", "c"]))),
            playlists: Arc::new(playlists),
            favourites: Arc::new(favourites),
        };

        Self {
            router: build_router(ctx.clone()),
            output,
            ctx,
        }
    }

    /// Send a request and decode the JSON body (Null when empty)
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);

        let request = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                builder.body(Body::from(json.to_string())).unwrap()
            }
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn post_empty(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::POST, path, None).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, None).await
    }
}
