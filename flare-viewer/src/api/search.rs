//! Search stream endpoint

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use flare_common::sse::search_event_stream;

use crate::search::{rejection_events, SearchParams, SearchQuery};
use crate::AppState;

/// Events buffered between the search task and the SSE writer
const EVENT_BUFFER: usize = 64;

/// GET /api/search/stream?session=UUID&startDate=..&endDate=..&wavelength=..
///
/// Starts a search and streams its progress as SSE. Starting a valid search
/// for a session supersedes that session's previous search; an invalid one
/// only reports the validation error. The stream closes when the search
/// reaches a terminal phase.
pub async fn search_stream(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = params.session.unwrap_or_else(Uuid::new_v4);
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    if let Err(e) = SearchQuery::from_params(&params) {
        let generation = state.sessions.peek_generation(session).await;
        info!(%session, generation, "Search rejected: {}", e);
        for event in rejection_events(generation, &e) {
            // Fresh channel with room for every event
            let _ = tx.try_send(event);
        }
        return search_event_stream(rx);
    }

    let ctx = state.sessions.begin(session, tx).await;
    info!(
        %session,
        generation = ctx.generation(),
        start = ?params.start_date,
        end = ?params.end_date,
        wavelength = ?params.wavelength,
        "Search requested"
    );

    let service = state.search.clone();
    tokio::spawn(async move {
        service.run(ctx, params).await;
    });

    search_event_stream(rx)
}
