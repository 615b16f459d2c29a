//! DONKI Client
//!
//! Queries NASA's Space Weather Database Of Notifications, Knowledge,
//! Information (DONKI) for solar flare records.
//!
//! # API Reference
//! - Endpoint: https://api.nasa.gov/DONKI/FLR?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD&api_key=KEY
//! - Documentation: https://api.nasa.gov/ (DONKI section)
//!
//! An empty result is sometimes reported as an empty body rather than `[]`;
//! callers must tolerate both.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use flare_common::config::ApiKey;

use super::{FlareSource, UpstreamClientError, UpstreamReply};

/// DONKI flare feed client
///
/// Holds the server-side API key and appends it to every request. The key is
/// never included in log output.
pub struct DonkiClient {
    http_client: Client,
    /// Base URL without trailing slash, e.g. `https://api.nasa.gov/DONKI`
    base_url: String,
    api_key: ApiKey,
}

impl DonkiClient {
    pub fn new(http_client: Client, base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn flr_url(&self) -> String {
        format!("{}/FLR", self.base_url)
    }
}

#[async_trait]
impl FlareSource for DonkiClient {
    async fn fetch_flares(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<UpstreamReply, UpstreamClientError> {
        let url = self.flr_url();
        debug!(url = %url, start_date, end_date, "Querying DONKI flares");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("startDate", start_date),
                ("endDate", end_date),
                ("api_key", self.api_key.expose()),
            ])
            .send()
            .await
            // reqwest errors embed the full URL; strip it so the key stays private
            .map_err(|e| UpstreamClientError::Network(e.without_url().to_string()))?;

        let reply = UpstreamReply::from_response(response).await?;
        debug!(status = reply.status, bytes = reply.body.len(), "DONKI response");
        Ok(reply)
    }
}
