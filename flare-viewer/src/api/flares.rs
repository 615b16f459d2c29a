//! One-shot JSON endpoints
//!
//! Non-streaming access to the two halves of a search, for scripts and
//! clients without SSE support.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use flare_common::{FlareCard, FlareEvent};

use crate::error::{ApiError, ApiResult};
use crate::resolver::ImageLocator;
use crate::search::{SearchParams, SearchQuery};
use crate::AppState;

/// Flare list response
#[derive(Debug, Serialize)]
pub struct FlaresResponse {
    pub start_date: String,
    pub end_date: String,
    pub total: usize,
    pub flares: Vec<FlareEvent>,
    pub cards: Vec<FlareCard>,
}

/// Query parameters for image resolution
#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    #[serde(rename = "peakTime")]
    pub peak_time: Option<String>,
    pub wavelength: Option<String>,
}

/// GET /api/flares?startDate=..&endDate=..
///
/// Validates the range and returns the decoded flare list with display cards.
pub async fn list_flares(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<FlaresResponse>> {
    let query = SearchQuery::from_params(&params)?;
    let flares = state.search.fetch_flares(&query).await?;
    debug!(count = flares.len(), "Listing flares");

    Ok(Json(FlaresResponse {
        start_date: query.start_param(),
        end_date: query.end_param(),
        total: flares.len(),
        cards: flares.iter().map(FlareCard::from).collect(),
        flares,
    }))
}

/// GET /api/resolve?peakTime=..&wavelength=..
///
/// Runs the wavelength fallback sequence for a single peak time.
pub async fn resolve_image(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> ApiResult<Json<ImageLocator>> {
    let peak_time = query
        .peak_time
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing peakTime parameter".to_string()))?;
    let wavelength = query
        .wavelength
        .unwrap_or_else(|| crate::search::query::DEFAULT_WAVELENGTH.to_string());

    let locator = state
        .resolver
        .resolve_image(Some(&peak_time), &wavelength)
        .await?;
    Ok(Json(locator))
}
