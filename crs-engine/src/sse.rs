//! SSE surface for live document updates
//!
//! Streams one session's document events to a connected viewer. The
//! subscription is dropped when the client disconnects and the stream is
//! torn down, which unsubscribes it from the hub on every exit path.

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
};
use chrono::Utc;
use futures::stream::Stream;
use std::convert::Infallible;
use tracing::{debug, info};
use uuid::Uuid;

use crs_common::events::DocumentEvent;

use crate::hub::StreamItem;
use crate::state::AppState;

/// GET /sessions/{session_id}/events - per-session SSE event stream
pub async fn session_events(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        "New SSE client for session {} ({} already connected)",
        session_id,
        state.hub.subscriber_count(session_id)
    );

    let mut subscription = state.hub.subscribe(session_id);
    let keepalive = state.keepalive;

    let stream = async_stream::stream! {
        // Initial connected status so clients can confirm the stream is up
        yield Ok(Event::default().event("connection_status").data("connected"));

        loop {
            match subscription.next_event(keepalive).await {
                Some(StreamItem::Event(event)) => {
                    match Event::default().event(event.event_name()).json_data(&event) {
                        Ok(sse_event) => yield Ok(sse_event),
                        Err(e) => debug!("Skipping unserializable event: {}", e),
                    }
                }
                Some(StreamItem::Keepalive) => {
                    debug!("SSE: keepalive for session {}", session_id);
                    let marker = DocumentEvent::Keepalive {
                        session_id,
                        timestamp: Utc::now(),
                    };
                    match Event::default().event(marker.event_name()).json_data(&marker) {
                        Ok(sse_event) => yield Ok(sse_event),
                        Err(e) => debug!("Skipping keepalive marker: {}", e),
                    }
                }
                // Queue closed: hub shut down
                None => break,
            }
        }
    };

    Sse::new(stream)
}
