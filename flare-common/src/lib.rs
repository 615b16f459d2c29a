//! # Flare Viewer Common Library
//!
//! Shared code for the flare viewer service:
//! - Configuration loading and credential resolution
//! - Flare event records and their display cards
//! - Search event types streamed to the browser
//! - SSE helpers
//! - Timestamp normalization

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use events::{SearchEvent, SearchPhase};
pub use models::{FlareCard, FlareEvent};
