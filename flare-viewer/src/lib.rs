//! flare-viewer library
//!
//! Solar flare viewer service: a search page, an SSE search stream that
//! resolves one Helioviewer image per DONKI flare, and proxy routes for both
//! upstream services.

pub mod api;
pub mod error;
pub mod resolver;
pub mod search;
pub mod upstream;

pub use crate::error::{ApiError, ApiResult};

use axum::http::{header, HeaderValue};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use flare_common::config::ViewerConfig;

use crate::resolver::ImageResolver;
use crate::search::{SearchRegistry, SearchService};
use crate::upstream::{
    build_http_client, DonkiClient, FlareSource, HelioviewerClient, ImagerySource,
    UpstreamClientError,
};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// DONKI flare feed (credential held inside the client)
    pub flares: Arc<dyn FlareSource>,
    /// Helioviewer imagery service
    pub imagery: Arc<dyn ImagerySource>,
    /// Wavelength fallback resolver over `imagery`
    pub resolver: ImageResolver,
    /// Search orchestration
    pub search: Arc<SearchService>,
    /// Per-session search generations
    pub sessions: SearchRegistry,
    /// Concurrent image resolutions per search
    pub image_workers: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create application state over the given upstream sources
    pub fn new(
        flares: Arc<dyn FlareSource>,
        imagery: Arc<dyn ImagerySource>,
        image_workers: usize,
    ) -> Self {
        let image_workers = image_workers.max(1);
        let resolver = ImageResolver::new(Arc::clone(&imagery));
        let search = Arc::new(SearchService::new(
            Arc::clone(&flares),
            resolver.clone(),
            image_workers,
        ));

        Self {
            flares,
            imagery,
            resolver,
            search,
            sessions: SearchRegistry::new(),
            image_workers,
            startup_time: Utc::now(),
        }
    }

    /// Create application state with reqwest clients built from configuration
    pub fn from_config(config: &ViewerConfig) -> Result<Self, UpstreamClientError> {
        let http_client = build_http_client(config.request_timeout)?;

        let flares: Arc<dyn FlareSource> = Arc::new(DonkiClient::new(
            http_client.clone(),
            config.donki_base_url.clone(),
            config.api_key.clone(),
        ));
        let imagery: Arc<dyn ImagerySource> = Arc::new(HelioviewerClient::new(
            http_client,
            config.helioviewer_base_url.clone(),
        ));

        Ok(Self::new(flares, imagery, config.image_workers))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    // Proxy responses must be readable from any origin, error replies included
    let proxy = Router::new()
        .route("/api/donki", get(api::proxy_events))
        .route("/api/helioviewer", get(api::proxy_imagery))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ));

    let app = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/search/stream", get(api::search_stream))
        .route("/api/flares", get(api::list_flares))
        .route("/api/resolve", get(api::resolve_image))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(app)
        .merge(proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
