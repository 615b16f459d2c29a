//! Helioviewer Client
//!
//! Thin forwarding client for the Helioviewer v2 API. Parameter construction
//! for each operation lives with the caller (see `resolver`); this client only
//! maps an [`ImageryEndpoint`] to its URL and returns the raw reply.
//!
//! # API Reference
//! - `GET {base}/getClosestImage/?date&sourceId` → JSON `{ id, date, ... }`
//! - `GET {base}/takeScreenshot/?date&imageScale&layers&x0&y0&width&height&format` → JSON `{ id }`
//! - `GET {base}/downloadScreenshot/?id` → image bytes
//! - Documentation: https://api.helioviewer.org/docs/v2/

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ImageryEndpoint, ImagerySource, UpstreamClientError, UpstreamReply};

/// Helioviewer v2 client
pub struct HelioviewerClient {
    http_client: Client,
    /// Base URL without trailing slash, e.g. `https://api.helioviewer.org/v2`
    base_url: String,
}

impl HelioviewerClient {
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    fn endpoint_url(&self, endpoint: ImageryEndpoint) -> String {
        format!("{}/{}/", self.base_url, endpoint.as_str())
    }
}

#[async_trait]
impl ImagerySource for HelioviewerClient {
    async fn call(
        &self,
        endpoint: ImageryEndpoint,
        params: &[(String, String)],
    ) -> Result<UpstreamReply, UpstreamClientError> {
        let url = self.endpoint_url(endpoint);
        debug!(url = %url, ?params, "Calling Helioviewer");

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| UpstreamClientError::Network(e.to_string()))?;

        let reply = UpstreamReply::from_response(response).await?;
        debug!(
            endpoint = %endpoint,
            status = reply.status,
            bytes = reply.body.len(),
            "Helioviewer response"
        );
        Ok(reply)
    }
}
