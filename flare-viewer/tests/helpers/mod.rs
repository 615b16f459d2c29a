//! Shared test fixtures: scripted upstream fakes and a local HTTP server
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

use flare_common::{SearchEvent, SearchPhase};
use flare_viewer::search::{SearchParams, SearchRegistry, SearchService};
use flare_viewer::upstream::{
    FlareSource, ImageryEndpoint, ImagerySource, UpstreamClientError, UpstreamReply,
};

/// Query parameter lookup
pub fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// =============================================================================
// Flare feed fake
// =============================================================================

pub enum FlareOutcome {
    Reply(UpstreamReply),
    NetworkError(String),
}

pub struct FakeFlares {
    outcome: FlareOutcome,
    calls: AtomicUsize,
    ranges: Mutex<Vec<(String, String)>>,
}

impl FakeFlares {
    pub fn new(outcome: FlareOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
        })
    }

    /// Feed answering 200 with the given JSON document
    pub fn with_json(value: serde_json::Value) -> Arc<Self> {
        Self::new(FlareOutcome::Reply(UpstreamReply::json_ok(&value)))
    }

    /// Feed answering with `status` and an empty body
    pub fn with_status(status: u16) -> Arc<Self> {
        Self::new(FlareOutcome::Reply(UpstreamReply::new(status, None, Vec::new())))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ranges(&self) -> Vec<(String, String)> {
        self.ranges.lock().unwrap().clone()
    }
}

#[async_trait]
impl FlareSource for FakeFlares {
    async fn fetch_flares(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<UpstreamReply, UpstreamClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ranges
            .lock()
            .unwrap()
            .push((start_date.to_string(), end_date.to_string()));

        match &self.outcome {
            FlareOutcome::Reply(reply) => Ok(reply.clone()),
            FlareOutcome::NetworkError(msg) => Err(UpstreamClientError::Network(msg.clone())),
        }
    }
}

/// DONKI-shaped flare record
pub fn flare_json(class_type: &str, peak_time: &str) -> serde_json::Value {
    json!({
        "flrID": format!("{}-FLR-001", peak_time),
        "classType": class_type,
        "beginTime": peak_time,
        "peakTime": peak_time,
        "endTime": peak_time,
        "sourceLocation": "N10W20",
        "activeRegionNum": 13000,
        "link": "https://webtools.ccmc.gsfc.nasa.gov/DONKI/view/FLR/1/-1"
    })
}

// =============================================================================
// Imagery fake
// =============================================================================

type ImageryScript =
    dyn Fn(ImageryEndpoint, &[(String, String)]) -> Result<UpstreamReply, UpstreamClientError>
        + Send
        + Sync;

/// Imagery source answering from a script and recording every call
pub struct FakeImagery {
    script: Box<ImageryScript>,
    calls: Mutex<Vec<(ImageryEndpoint, Vec<(String, String)>)>>,
}

impl FakeImagery {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(ImageryEndpoint, &[(String, String)]) -> Result<UpstreamReply, UpstreamClientError>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every operation answers 500
    pub fn always_failing() -> Arc<Self> {
        Self::new(|_, _| Ok(UpstreamReply::new(500, None, b"boom".to_vec())))
    }

    /// Succeeds only for `source_id`, numbering screenshot jobs by source id
    pub fn succeeding_for(source_id: &'static str) -> Arc<Self> {
        Self::new(move |endpoint, params| match endpoint {
            ImageryEndpoint::GetClosestImage if param(params, "sourceId") == Some(source_id) => {
                Ok(closest_image_reply("2023-01-01 12:33:55"))
            }
            ImageryEndpoint::GetClosestImage => Ok(UpstreamReply::json_ok(
                &json!({"error": "No images available"}),
            )),
            ImageryEndpoint::TakeScreenshot => {
                Ok(UpstreamReply::json_ok(&json!({ "id": format!("job-{}", source_id) })))
            }
            ImageryEndpoint::DownloadScreenshot => Ok(UpstreamReply::new(
                200,
                Some("image/jpeg".to_string()),
                vec![0xFF, 0xD8, 0xFF],
            )),
        })
    }

    pub fn calls(&self) -> Vec<(ImageryEndpoint, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `sourceId` of every `getClosestImage` call, in order
    pub fn closest_source_ids(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|(e, _)| *e == ImageryEndpoint::GetClosestImage)
            .filter_map(|(_, p)| param(p, "sourceId").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl ImagerySource for FakeImagery {
    async fn call(
        &self,
        endpoint: ImageryEndpoint,
        params: &[(String, String)],
    ) -> Result<UpstreamReply, UpstreamClientError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint, params.to_vec()));
        (self.script)(endpoint, params)
    }
}

pub fn closest_image_reply(date: &str) -> UpstreamReply {
    UpstreamReply::json_ok(&json!({
        "id": "79536545",
        "date": date,
        "name": "AIA 193",
        "scale": 0.6
    }))
}

// =============================================================================
// Search driver
// =============================================================================

pub fn search_params(start: &str, end: &str, wavelength: &str) -> SearchParams {
    SearchParams {
        session: Some(Uuid::new_v4()),
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
        wavelength: Some(wavelength.to_string()),
    }
}

/// Run one search to completion and collect everything it emitted
pub async fn run_search(
    service: &SearchService,
    params: SearchParams,
) -> (Option<SearchPhase>, Vec<SearchEvent>) {
    let registry = SearchRegistry::new();
    let (tx, mut rx) = mpsc::channel(1024);
    let session = params.session.unwrap_or_else(Uuid::new_v4);
    let ctx = registry.begin(session, tx).await;

    let outcome = service.run(ctx, params).await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    (outcome, events)
}

/// Messages of all status events, in order
pub fn statuses(events: &[SearchEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            SearchEvent::StatusChanged { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Phases of all phase events, in order
pub fn phases(events: &[SearchEvent]) -> Vec<SearchPhase> {
    events
        .iter()
        .filter_map(|e| match e {
            SearchEvent::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Local HTTP server
// =============================================================================

/// Serve `router` on an ephemeral localhost port; returns `http://127.0.0.1:<port>`
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind ephemeral port");
    let addr = listener.local_addr().expect("Should have local address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{}", addr)
}
