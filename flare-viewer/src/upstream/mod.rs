//! Upstream service clients
//!
//! Two external collaborators sit behind async traits so the proxy routes and
//! the image resolver share one seam (and tests can substitute fakes):
//! - [`FlareSource`]: NASA DONKI flare feed
//! - [`ImagerySource`]: Helioviewer v2 (closest image, screenshot job, download)

pub mod donki;
pub mod helioviewer;

pub use donki::DonkiClient;
pub use helioviewer::HelioviewerClient;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// User-Agent sent on every upstream request
const USER_AGENT: &str = concat!("flare-viewer/", env!("CARGO_PKG_VERSION"));

/// Upstream client errors
#[derive(Debug, Error)]
pub enum UpstreamClientError {
    /// Connection, DNS, TLS or timeout failure
    #[error("request failed: {0}")]
    Network(String),

    /// Body could not be read or decoded
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Raw upstream response: status, content type and body bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl UpstreamReply {
    pub fn new(status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    /// JSON reply with status 200
    pub fn json_ok(value: &serde_json::Value) -> Self {
        Self::new(
            200,
            Some("application/json".to_string()),
            value.to_string().into_bytes(),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text (invalid UTF-8 replaced)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, UpstreamClientError> {
        serde_json::from_slice(&self.body).map_err(|e| UpstreamClientError::Decode(e.to_string()))
    }

    /// Drain a reqwest response into an owned reply
    pub(crate) async fn from_response(
        response: reqwest::Response,
    ) -> Result<Self, UpstreamClientError> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamClientError::Decode(e.to_string()))?;

        Ok(Self::new(status, content_type, body.to_vec()))
    }
}

/// The three Helioviewer operations the viewer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageryEndpoint {
    GetClosestImage,
    TakeScreenshot,
    DownloadScreenshot,
}

impl ImageryEndpoint {
    pub const ALL: [ImageryEndpoint; 3] = [
        ImageryEndpoint::GetClosestImage,
        ImageryEndpoint::TakeScreenshot,
        ImageryEndpoint::DownloadScreenshot,
    ];

    /// Path segment / `endpoint` query value
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageryEndpoint::GetClosestImage => "getClosestImage",
            ImageryEndpoint::TakeScreenshot => "takeScreenshot",
            ImageryEndpoint::DownloadScreenshot => "downloadScreenshot",
        }
    }

    /// Whether the operation returns binary image data rather than JSON
    pub fn is_binary(&self) -> bool {
        matches!(self, ImageryEndpoint::DownloadScreenshot)
    }
}

impl fmt::Display for ImageryEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageryEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("Unknown endpoint: {}", s))
    }
}

/// Source of flare event records
#[async_trait]
pub trait FlareSource: Send + Sync {
    /// Fetch the raw flare list for an inclusive `YYYY-MM-DD` date range
    ///
    /// Implementations attach the server-held credential themselves.
    async fn fetch_flares(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<UpstreamReply, UpstreamClientError>;
}

/// Source of solar imagery
#[async_trait]
pub trait ImagerySource: Send + Sync {
    /// Invoke one imagery operation with the given query parameters
    async fn call(
        &self,
        endpoint: ImageryEndpoint,
        params: &[(String, String)],
    ) -> Result<UpstreamReply, UpstreamClientError>;
}

/// Build the shared reqwest client
///
/// No timeout unless one is configured; the transport default applies.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, UpstreamClientError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_static(USER_AGENT),
    );

    let mut builder = Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| UpstreamClientError::Network(format!("Failed to create HTTP client: {}", e)))
}
