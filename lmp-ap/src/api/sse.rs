//! Server-Sent Events (SSE) stream
//!
//! A new client first receives a `PlayerState` event holding the current
//! [`PlayerView`](crate::state::PlayerView), then every
//! [`LmpEvent`](lmp_common::events::LmpEvent) broadcast after it subscribed.

use crate::api::server::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

fn to_sse<T: Serialize>(name: &'static str, payload: &T) -> Option<Result<Event, Infallible>> {
    match serde_json::to_string(payload) {
        Ok(json) => Some(Ok(Event::default().event(name).data(json))),
        Err(e) => {
            warn!("Failed to serialize {} event: {}", name, e);
            None
        }
    }
}

/// GET /events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before taking the snapshot so nothing falls in between
    let rx = ctx.state.subscribe_events();
    let snapshot = ctx.state.get_view().await;
    debug!("SSE client connected ({:?})", snapshot.state);

    let initial = stream::iter(to_sse("PlayerState", &snapshot));

    let updates = BroadcastStream::new(rx).filter_map(|received| async move {
        match received {
            Ok(event) => to_sse(event.event_type(), &event),
            Err(e) => {
                // Lagged clients skip what they missed
                warn!("SSE client lagging: {}", e);
                None
            }
        }
    });

    Sse::new(initial.chain(updates)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
