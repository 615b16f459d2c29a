//! Build and search-settings endpoint

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::resolver::DEFAULT_FALLBACK;
use crate::AppState;

/// Build identity plus the search settings this instance runs with
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
    /// Concurrent image resolutions per search
    pub image_workers: usize,
    /// Wavelengths tried after the preferred one, in order
    pub fallback_wavelengths: Vec<String>,
}

/// GET /api/buildinfo
pub async fn get_build_info(State(state): State<AppState>) -> Json<BuildInfo> {
    Json(BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
        image_workers: state.image_workers,
        fallback_wavelengths: DEFAULT_FALLBACK.iter().map(|w| w.to_string()).collect(),
    })
}
