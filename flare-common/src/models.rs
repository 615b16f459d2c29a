//! Flare event records and their display cards

use serde::{Deserialize, Serialize};

use crate::time::display_timestamp;

/// One solar flare record as reported by the DONKI `FLR` feed
///
/// The feed is loosely typed, so every field tolerates being absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlareEvent {
    /// GOES X-ray class, e.g. `M1.2`
    #[serde(default)]
    pub class_type: Option<String>,
    #[serde(default)]
    pub peak_time: Option<String>,
    #[serde(default)]
    pub begin_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Heliographic location, e.g. `N15W30`
    #[serde(default)]
    pub source_location: Option<String>,
    /// DONKI event detail page
    #[serde(default)]
    pub link: Option<String>,
    /// NOAA active region number
    #[serde(default)]
    pub active_region_num: Option<i64>,
}

/// Display view of a [`FlareEvent`]
///
/// All strings are plain text; the page inserts them with `textContent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlareCard {
    /// Badge text, e.g. `M1.2 flare`
    pub class_label: String,
    /// Second badge, e.g. `AR 13182`
    pub active_region: Option<String>,
    pub peak: String,
    pub begin: String,
    pub end: String,
    pub source: String,
    pub link: Option<String>,
}

impl From<&FlareEvent> for FlareCard {
    fn from(event: &FlareEvent) -> Self {
        let class_type = non_empty(event.class_type.as_deref()).unwrap_or("Unknown");

        Self {
            class_label: format!("{} flare", class_type),
            // Region 0 means "unassigned" upstream
            active_region: event
                .active_region_num
                .filter(|n| *n != 0)
                .map(|n| format!("AR {}", n)),
            peak: display_timestamp(event.peak_time.as_deref()),
            begin: display_timestamp(event.begin_time.as_deref()),
            end: display_timestamp(event.end_time.as_deref()),
            source: non_empty(event.source_location.as_deref())
                .unwrap_or("Unknown")
                .to_string(),
            link: non_empty(event.link.as_deref()).map(str::to_string),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
