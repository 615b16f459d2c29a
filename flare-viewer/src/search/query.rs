//! Search form input and validation

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::SearchError;

/// Wavelength used when the form does not send one
pub const DEFAULT_WAVELENGTH: &str = "193";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw query parameters of `GET /api/search/stream`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Browser session id; a fresh one is generated when absent
    #[serde(default)]
    pub session: Option<Uuid>,
    #[serde(default, rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub wavelength: Option<String>,
}

/// Validated search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub preferred_wavelength: String,
}

impl SearchQuery {
    /// Validate form state
    ///
    /// Both dates must be present and parse as `YYYY-MM-DD`, and the range must
    /// not be inverted. Equal dates are a valid single-day range.
    pub fn from_params(params: &SearchParams) -> Result<Self, SearchError> {
        let start = present(params.start_date.as_deref());
        let end = present(params.end_date.as_deref());

        let (Some(start), Some(end)) = (start, end) else {
            return Err(SearchError::InvalidRange(
                "Please select both start and end dates.".to_string(),
            ));
        };

        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;

        if start_date > end_date {
            return Err(SearchError::InvalidRange(
                "Start date must be before end date.".to_string(),
            ));
        }

        let preferred_wavelength = present(params.wavelength.as_deref())
            .unwrap_or(DEFAULT_WAVELENGTH)
            .to_string();

        Ok(Self {
            start_date,
            end_date,
            preferred_wavelength,
        })
    }

    /// Start date formatted for the upstream feed
    pub fn start_param(&self) -> String {
        self.start_date.format(DATE_FORMAT).to_string()
    }

    /// End date formatted for the upstream feed
    pub fn end_param(&self) -> String {
        self.end_date.format(DATE_FORMAT).to_string()
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(value: &str) -> Result<NaiveDate, SearchError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        SearchError::InvalidRange(format!("Invalid date (expected YYYY-MM-DD): {}", value))
    })
}
