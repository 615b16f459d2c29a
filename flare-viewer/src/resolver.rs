//! Image resolution sequence
//!
//! Finds a solar-disk image near a flare's peak time. Candidate wavelengths
//! are tried in order (preferred first, then 193, 171, 211 Å); each attempt
//! runs Helioviewer's three-step workflow:
//!
//! 1. `getClosestImage` for the peak time and the wavelength's source id
//! 2. `takeScreenshot` for the closest image's date (1024×1024 JPEG)
//! 3. hand back a download locator for the rendered job
//!
//! A failure at any step only fails that candidate. Failures are logged and
//! the next candidate is tried; the caller sees [`ResolveError::NoImageFound`]
//! once every candidate is exhausted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use flare_common::time::{parse_timestamp, to_iso_seconds};

use crate::upstream::{ImageryEndpoint, ImagerySource, UpstreamClientError};

/// Wavelengths tried after the preferred one
pub const DEFAULT_FALLBACK: [&str; 3] = ["193", "171", "211"];

/// Proxy route the browser downloads rendered screenshots from
pub const IMAGERY_PROXY_PATH: &str = "/api/helioviewer";

const IMAGE_SCALE: &str = "2.5";
const SCREENSHOT_SIZE: &str = "1024";
const SCREENSHOT_FORMAT: &str = "jpg";

/// SDO/AIA channels with a known Helioviewer source id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wavelength {
    A193,
    A171,
    A211,
}

impl Wavelength {
    pub const ALL: [Wavelength; 3] = [Wavelength::A193, Wavelength::A171, Wavelength::A211];

    /// Map a candidate string to a known wavelength
    pub fn lookup(candidate: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|w| w.angstrom().to_string() == candidate.trim())
    }

    pub fn angstrom(&self) -> u16 {
        match self {
            Wavelength::A193 => 193,
            Wavelength::A171 => 171,
            Wavelength::A211 => 211,
        }
    }

    /// Helioviewer data source id
    pub fn source_id(&self) -> u32 {
        match self {
            Wavelength::A193 => 14,
            Wavelength::A171 => 13,
            Wavelength::A211 => 15,
        }
    }

    /// Screenshot layer string: `[observatory,instrument,measurement,visible,opacity]`
    pub fn layer_descriptor(&self) -> String {
        format!("[SDO,AIA,{},1,100]", self.angstrom())
    }
}

/// Candidate order for a preferred wavelength
///
/// The preferred value comes first exactly once, followed by the defaults that
/// have not been seen yet.
pub fn fallback_order(preferred: &str) -> Vec<String> {
    let preferred = preferred.trim();
    let mut seen = HashSet::new();

    std::iter::once(preferred)
        .chain(DEFAULT_FALLBACK)
        .filter(|candidate| seen.insert(*candidate))
        .map(str::to_string)
        .collect()
}

/// Browser-facing locator for a rendered screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageLocator {
    /// Wavelength that produced the image
    pub wavelength: String,
    /// Helioviewer screenshot job id
    pub job_id: String,
    /// Proxy URL serving the rendered image bytes
    pub download_url: String,
}

impl ImageLocator {
    fn new(wavelength: Wavelength, job_id: String) -> Self {
        let download_url = download_url(&job_id);
        Self {
            wavelength: wavelength.angstrom().to_string(),
            job_id,
            download_url,
        }
    }
}

/// Relative proxy URL that downloads screenshot `job_id`
pub fn download_url(job_id: &str) -> String {
    let query = [
        ("endpoint", ImageryEndpoint::DownloadScreenshot.as_str()),
        ("id", job_id),
    ];
    // Only the path and query are used; the host is a placeholder.
    let base = format!("http://localhost{}", IMAGERY_PROXY_PATH);
    match reqwest::Url::parse_with_params(&base, &query) {
        Ok(url) => format!("{}?{}", url.path(), url.query().unwrap_or_default()),
        Err(_) => format!(
            "{}?endpoint={}&id={}",
            IMAGERY_PROXY_PATH,
            ImageryEndpoint::DownloadScreenshot.as_str(),
            job_id
        ),
    }
}

/// Resolution errors surfaced to callers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No valid screenshot found for any wavelength")]
    NoImageFound,
}

/// Why a single candidate failed (logged, never surfaced)
#[derive(Debug, Error)]
enum CandidateFailure {
    #[error("peak time missing or unparseable: {0:?}")]
    InvalidPeakTime(Option<String>),

    #[error("{endpoint} {source}")]
    Upstream {
        endpoint: ImageryEndpoint,
        source: UpstreamClientError,
    },

    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: ImageryEndpoint,
        status: u16,
    },

    #[error("{endpoint} response lacks usable `{field}`")]
    MissingField {
        endpoint: ImageryEndpoint,
        field: &'static str,
    },
}

/// Walks the wavelength fallback list against an [`ImagerySource`]
#[derive(Clone)]
pub struct ImageResolver {
    imagery: Arc<dyn ImagerySource>,
}

impl ImageResolver {
    pub fn new(imagery: Arc<dyn ImagerySource>) -> Self {
        Self { imagery }
    }

    /// Resolve an image for a flare peak time, preferring `preferred` Å
    pub async fn resolve_image(
        &self,
        peak_time: Option<&str>,
        preferred: &str,
    ) -> Result<ImageLocator, ResolveError> {
        let peak = peak_time.and_then(parse_timestamp);

        for candidate in fallback_order(preferred) {
            let Some(wavelength) = Wavelength::lookup(&candidate) else {
                debug!(candidate = %candidate, "Skipping unmapped wavelength");
                continue;
            };

            match self.try_candidate(peak.as_ref(), peak_time, wavelength).await {
                Ok(locator) => {
                    info!(
                        wavelength = %locator.wavelength,
                        job_id = %locator.job_id,
                        "Resolved screenshot"
                    );
                    return Ok(locator);
                }
                Err(failure) => {
                    warn!("Helioviewer failed for {}Å: {}", wavelength.angstrom(), failure);
                }
            }
        }

        Err(ResolveError::NoImageFound)
    }

    async fn try_candidate(
        &self,
        peak: Option<&DateTime<Utc>>,
        raw_peak: Option<&str>,
        wavelength: Wavelength,
    ) -> Result<ImageLocator, CandidateFailure> {
        let peak = peak
            .ok_or_else(|| CandidateFailure::InvalidPeakTime(raw_peak.map(str::to_string)))?;

        // Step 1: nearest image
        let closest = self
            .call_json(
                ImageryEndpoint::GetClosestImage,
                vec![
                    ("date".to_string(), to_iso_seconds(peak)),
                    ("sourceId".to_string(), wavelength.source_id().to_string()),
                ],
            )
            .await?;

        let image_date = closest
            .get("date")
            .and_then(|v| v.as_str())
            .and_then(parse_timestamp)
            .ok_or(CandidateFailure::MissingField {
                endpoint: ImageryEndpoint::GetClosestImage,
                field: "date",
            })?;

        // Step 2: screenshot job
        let screenshot = self
            .call_json(
                ImageryEndpoint::TakeScreenshot,
                screenshot_params(&image_date, wavelength),
            )
            .await?;

        let job_id = screenshot
            .get("id")
            .and_then(json_id)
            .ok_or(CandidateFailure::MissingField {
                endpoint: ImageryEndpoint::TakeScreenshot,
                field: "id",
            })?;

        // Step 3: the browser fetches the rendered image through the proxy
        Ok(ImageLocator::new(wavelength, job_id))
    }

    async fn call_json(
        &self,
        endpoint: ImageryEndpoint,
        params: Vec<(String, String)>,
    ) -> Result<serde_json::Value, CandidateFailure> {
        let reply = self
            .imagery
            .call(endpoint, &params)
            .await
            .map_err(|source| CandidateFailure::Upstream { endpoint, source })?;

        if !reply.is_success() {
            return Err(CandidateFailure::Status {
                endpoint,
                status: reply.status,
            });
        }

        reply
            .json()
            .map_err(|source| CandidateFailure::Upstream { endpoint, source })
    }
}

/// `takeScreenshot` parameters for one image date and wavelength
pub fn screenshot_params(image_date: &DateTime<Utc>, wavelength: Wavelength) -> Vec<(String, String)> {
    vec![
        ("date".to_string(), to_iso_seconds(image_date)),
        ("imageScale".to_string(), IMAGE_SCALE.to_string()),
        ("layers".to_string(), wavelength.layer_descriptor()),
        ("x0".to_string(), "0".to_string()),
        ("y0".to_string(), "0".to_string()),
        ("width".to_string(), SCREENSHOT_SIZE.to_string()),
        ("height".to_string(), SCREENSHOT_SIZE.to_string()),
        ("format".to_string(), SCREENSHOT_FORMAT.to_string()),
    ]
}

/// Job ids arrive as numbers or strings depending on API version
fn json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}
