//! Upstream proxy routes
//!
//! Lets the browser reach the two upstream services without seeing the NASA
//! credential and without cross-origin failures.
//!
//! Encoding rule: `downloadScreenshot` replies are image bytes and travel
//! base64-encoded inside [`ProxyResponse`] with `is_base64_encoded = true`;
//! every other reply travels as text. The HTTP transport
//! ([`IntoResponse`]) turns the envelope back into raw bytes.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::upstream::{ImageryEndpoint, UpstreamReply};
use crate::AppState;

const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";
const TEXT_TYPE: &str = "text/plain; charset=utf-8";

/// Query parameters for `GET /api/donki`
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default, rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<String>,
}

/// Transport envelope for one proxied reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    /// Text payload, passed through as-is
    pub fn text(status_code: u16, content_type: Option<String>, body: String) -> Self {
        Self {
            status_code,
            content_type,
            body,
            is_base64_encoded: false,
        }
    }

    /// Binary payload, base64-encoded for transport
    pub fn binary(status_code: u16, content_type: Option<String>, bytes: &[u8]) -> Self {
        Self {
            status_code,
            content_type,
            body: STANDARD.encode(bytes),
            is_base64_encoded: true,
        }
    }

    /// Proxy-side failure with a plain-text message
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::text(status.as_u16(), Some(TEXT_TYPE.to_string()), message.into())
    }

    /// Wrap an upstream reply using the per-endpoint encoding rule
    pub fn from_upstream(reply: UpstreamReply, binary: bool) -> Self {
        if binary {
            let content_type = reply
                .content_type
                .clone()
                .or_else(|| Some(DEFAULT_IMAGE_TYPE.to_string()));
            Self::binary(reply.status, content_type, &reply.body)
        } else {
            let body = reply.text();
            Self::text(reply.status, reply.content_type, body)
        }
    }

    /// Raw payload bytes after undoing transport encoding
    pub fn decode_body(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.is_base64_encoded {
            STANDARD.decode(self.body.as_bytes())
        } else {
            Ok(self.body.clone().into_bytes())
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let bytes = match self.decode_body() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Proxy envelope decode failed: {}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Proxy encoding error").into_response();
            }
        };

        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = (status, bytes).into_response();

        let content_type = self.content_type.as_deref().unwrap_or(TEXT_TYPE);
        if let Ok(value) = HeaderValue::from_str(content_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }

        response
    }
}

/// GET /api/donki?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD
///
/// Forwards to the DONKI flare feed with the server-held API key attached.
/// Status and body pass through verbatim.
pub async fn proxy_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> ProxyResponse {
    let (Some(start), Some(end)) = (query.start_date.as_deref(), query.end_date.as_deref()) else {
        return ProxyResponse::error(
            StatusCode::BAD_REQUEST,
            "Missing startDate or endDate parameter",
        );
    };

    match state.flares.fetch_flares(start, end).await {
        Ok(reply) => {
            debug!(status = reply.status, "Proxying DONKI reply");
            ProxyResponse::from_upstream(reply, false)
        }
        Err(e) => {
            warn!("DONKI proxy error: {}", e);
            ProxyResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("DONKI proxy error: {}", e),
            )
        }
    }
}

/// GET /api/helioviewer?endpoint=<operation>&...
///
/// Forwards every parameter except `endpoint` to the named Helioviewer
/// operation.
pub async fn proxy_imagery(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ProxyResponse {
    let Some(endpoint_name) = params
        .iter()
        .find(|(key, _)| key == "endpoint")
        .map(|(_, value)| value.clone())
    else {
        return ProxyResponse::error(StatusCode::BAD_REQUEST, "Missing endpoint parameter");
    };

    let endpoint: ImageryEndpoint = match endpoint_name.parse() {
        Ok(endpoint) => endpoint,
        Err(message) => return ProxyResponse::error(StatusCode::BAD_REQUEST, message),
    };

    let forwarded: Vec<(String, String)> = params
        .into_iter()
        .filter(|(key, _)| key != "endpoint")
        .collect();

    match state.imagery.call(endpoint, &forwarded).await {
        Ok(reply) => ProxyResponse::from_upstream(reply, endpoint.is_binary()),
        Err(e) => {
            warn!(%endpoint, "Helioviewer proxy error: {}", e);
            ProxyResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Helioviewer proxy error: {}", e),
            )
        }
    }
}
