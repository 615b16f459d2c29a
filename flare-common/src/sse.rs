//! Server-Sent Events (SSE) utilities

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::SearchEvent;

/// Heartbeat interval for idle streams
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Convert one search event into an SSE frame
///
/// The SSE event name is the event's `type`; the data is the JSON payload.
pub fn to_sse_event(event: &SearchEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event.event_type(), e);
            None
        }
    }
}

/// Wrap a search's event channel as an SSE response
///
/// The stream ends when the sending side is dropped, i.e. when the search
/// finishes. Dropping the response (client disconnect) closes the receiver,
/// which the sender observes on its next send.
pub fn search_event_stream(
    mut rx: mpsc::Receiver<SearchEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            debug!("SSE: Sending {} (generation {})", event.event_type(), event.generation());
            if let Some(frame) = to_sse_event(&event) {
                yield Ok(frame);
            }
        }
        debug!("SSE: Search stream finished");
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("heartbeat"),
    )
}
