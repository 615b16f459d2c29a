//! UI serving routes
//!
//! Serves the search form page and its script. The page holds no data of
//! its own: it opens the search stream and renders the events it receives.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{Duration, NaiveDate};

use crate::resolver::Wavelength;

const INDEX_HTML: &str = include_str!("../../ui/index.html");
const APP_JS: &str = include_str!("../../ui/app.js");

/// Days covered by the pre-filled date range
const DEFAULT_RANGE_DAYS: i64 = 7;

/// GET /
///
/// Serves the search page with the date range preset to the last week (UTC).
pub async fn serve_index() -> Html<String> {
    let today = flare_common::time::now().date_naive();
    Html(render_index(today))
}

/// Fill the page template for a given "today"
pub fn render_index(today: NaiveDate) -> String {
    let start = today - Duration::days(DEFAULT_RANGE_DAYS);

    let options: String = Wavelength::ALL
        .iter()
        .map(|w| {
            format!(
                r#"<option value="{0}">{0} Å</option>"#,
                w.angstrom()
            )
        })
        .collect::<Vec<_>>()
        .join("\n          ");

    INDEX_HTML
        .replace("{{START_DATE}}", &start.format("%Y-%m-%d").to_string())
        .replace("{{END_DATE}}", &today.format("%Y-%m-%d").to_string())
        .replace("{{WAVELENGTH_OPTIONS}}", &options)
        .replace("{{VERSION}}", env!("CARGO_PKG_VERSION"))
}

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        APP_JS,
    )
        .into_response()
}
