//! Flare search orchestration
//!
//! One search walks the state machine
//! `Idle → Validating → FetchingEvents → (Empty | FetchingImages → Done) | Error`
//! and reports every step through a [`SearchContext`]:
//!
//! - invalid input stops before any network call
//! - a failed flare fetch aborts the whole search
//! - every flare gets a card before any image is resolved
//! - image failures only mark their own card as unavailable
//!
//! Resolution runs through a bounded, order-preserving buffer: with the
//! default of one worker, flares are resolved strictly one after another.

pub mod query;
pub mod session;
pub mod view;

pub use query::{SearchParams, SearchQuery};
pub use session::{SearchCancelled, SearchContext, SearchRegistry};
pub use view::{CardImage, CardView, ResultsView};

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use flare_common::{FlareCard, FlareEvent, SearchEvent, SearchPhase};

use crate::resolver::ImageResolver;
use crate::upstream::{FlareSource, UpstreamClientError, UpstreamReply};

/// Card text when no wavelength produced an image
pub const IMAGE_UNAVAILABLE: &str = "Image unavailable";

/// Search failures that end the search
#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing, malformed or inverted date range
    #[error("{0}")]
    InvalidRange(String),

    /// Flare feed answered with a non-success status
    #[error("DONKI request failed ({status})")]
    Upstream { status: u16 },

    /// Flare feed could not be reached
    #[error("DONKI request failed: {0}")]
    Transport(#[from] UpstreamClientError),

    /// Flare feed answered with something other than flare records
    #[error("Unexpected DONKI payload: {0}")]
    Payload(String),
}

/// Runs searches against the flare feed and the image resolver
pub struct SearchService {
    flares: Arc<dyn FlareSource>,
    resolver: ImageResolver,
    image_workers: usize,
}

impl SearchService {
    pub fn new(flares: Arc<dyn FlareSource>, resolver: ImageResolver, image_workers: usize) -> Self {
        Self {
            flares,
            resolver,
            image_workers: image_workers.max(1),
        }
    }

    /// Run one search to completion
    ///
    /// Returns the terminal phase, or `None` if the search was superseded or
    /// its client went away.
    pub async fn run(&self, ctx: SearchContext, params: SearchParams) -> Option<SearchPhase> {
        let generation = ctx.generation();
        let outcome = self.drive(&ctx, &params).await;
        ctx.finish().await;

        match outcome {
            Ok(phase) => {
                info!(generation, ?phase, "Search finished");
                Some(phase)
            }
            Err(reason) => {
                info!(generation, "Search stopped: {}", reason);
                None
            }
        }
    }

    async fn drive(
        &self,
        ctx: &SearchContext,
        params: &SearchParams,
    ) -> Result<SearchPhase, SearchCancelled> {
        ctx.phase(SearchPhase::Validating).await?;

        let query = match SearchQuery::from_params(params) {
            Ok(query) => query,
            Err(e) => {
                ctx.status(e.to_string(), true).await?;
                ctx.phase(SearchPhase::Idle).await?;
                return Ok(SearchPhase::Idle);
            }
        };

        ctx.phase(SearchPhase::FetchingEvents).await?;
        ctx.status("Fetching solar flare data…", false).await?;

        let flares = match self.fetch_flares(&query).await {
            Ok(flares) => flares,
            Err(e) => {
                error!("Flare fetch failed: {}", e);
                ctx.status(format!("Error: {}", e), true).await?;
                ctx.phase(SearchPhase::Error).await?;
                return Ok(SearchPhase::Error);
            }
        };

        if flares.is_empty() {
            ctx.status_with_hint(
                "No flares found in that window.",
                false,
                Some("Try expanding the date range.".to_string()),
            )
            .await?;
            ctx.phase(SearchPhase::Empty).await?;
            return Ok(SearchPhase::Empty);
        }

        ctx.status(
            format!("Found {} flare(s). Fetching images…", flares.len()),
            false,
        )
        .await?;
        ctx.phase(SearchPhase::FetchingImages).await?;

        for (index, flare) in flares.iter().enumerate() {
            ctx.card_created(index, FlareCard::from(flare)).await?;
        }

        // Each future owns its inputs so the search stays spawnable
        let mut results = stream::iter(flares.into_iter().enumerate())
            .map(|(index, flare)| {
                let resolver = self.resolver.clone();
                let preferred = query.preferred_wavelength.clone();
                async move {
                    let result = resolver
                        .resolve_image(flare.peak_time.as_deref(), &preferred)
                        .await;
                    (index, result)
                }
            })
            .buffered(self.image_workers);

        while let Some((index, result)) = results.next().await {
            match result {
                Ok(locator) => ctx.image_resolved(index, &locator).await?,
                Err(e) => {
                    info!(index, "No image for flare: {}", e);
                    ctx.image_unavailable(index, IMAGE_UNAVAILABLE).await?
                }
            }
        }

        ctx.status("Done.", false).await?;
        ctx.phase(SearchPhase::Done).await?;
        Ok(SearchPhase::Done)
    }

    /// Fetch and decode the flare list for a validated query
    pub async fn fetch_flares(&self, query: &SearchQuery) -> Result<Vec<FlareEvent>, SearchError> {
        let reply = self
            .flares
            .fetch_flares(&query.start_param(), &query.end_param())
            .await?;

        if !reply.is_success() {
            return Err(SearchError::Upstream {
                status: reply.status,
            });
        }

        parse_flares(&reply)
    }
}

/// Events for a search rejected before it started
///
/// Mirrors what [`SearchService::run`] reports for invalid input, without
/// registering the search, so a search already running for the session is
/// left alone.
pub fn rejection_events(generation: u64, error: &SearchError) -> Vec<SearchEvent> {
    vec![
        SearchEvent::PhaseChanged {
            generation,
            phase: SearchPhase::Validating,
        },
        SearchEvent::StatusChanged {
            generation,
            message: error.to_string(),
            is_error: true,
            hint: None,
        },
        SearchEvent::PhaseChanged {
            generation,
            phase: SearchPhase::Idle,
        },
    ]
}

/// Decode a flare feed body
///
/// An empty body or a non-array document means "no flares". Array entries
/// that are not flare records are skipped; only invalid JSON is a payload
/// error.
pub fn parse_flares(reply: &UpstreamReply) -> Result<Vec<FlareEvent>, SearchError> {
    if reply.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let document: serde_json::Value = reply
        .json()
        .map_err(|e| SearchError::Payload(e.to_string()))?;

    let serde_json::Value::Array(records) = document else {
        return Ok(Vec::new());
    };

    let total = records.len();
    let flares: Vec<FlareEvent> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(flare) => Some(flare),
            Err(e) => {
                warn!(index, "Skipping undecodable DONKI record: {}", e);
                None
            }
        })
        .collect();

    if flares.len() < total {
        warn!("Decoded {} of {} DONKI records", flares.len(), total);
    }
    Ok(flares)
}
