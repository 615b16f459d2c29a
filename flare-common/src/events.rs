//! Search event types
//!
//! A search runs on the server and reports its progress to the browser as a
//! sequence of [`SearchEvent`]s over SSE. The page applies them to the DOM in
//! arrival order; events carry the search generation so a page can ignore
//! updates from a search it has already replaced.

use serde::{Deserialize, Serialize};

use crate::models::FlareCard;

/// Phase of one search action
///
/// `Idle → Validating → FetchingEvents → (Empty | FetchingImages → Done) | Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    Validating,
    FetchingEvents,
    Empty,
    FetchingImages,
    Done,
    Error,
}

impl SearchPhase {
    /// Whether the search has finished (successfully or not)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SearchPhase::Idle | SearchPhase::Empty | SearchPhase::Done | SearchPhase::Error
        )
    }
}

/// Search progress events
///
/// Serialized with a `type` tag for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SearchEvent {
    /// State machine transition
    PhaseChanged {
        generation: u64,
        phase: SearchPhase,
    },

    /// Status line text
    StatusChanged {
        generation: u64,
        message: String,
        is_error: bool,
        /// Secondary text shown in the results area (empty-result hint)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },

    /// Card placeholder for one flare (spinner until resolved)
    CardCreated {
        generation: u64,
        index: usize,
        card: FlareCard,
    },

    /// Image located for a card
    CardImageResolved {
        generation: u64,
        index: usize,
        image_url: String,
        wavelength: String,
    },

    /// No image could be located for a card
    CardImageUnavailable {
        generation: u64,
        index: usize,
        reason: String,
    },
}

impl SearchEvent {
    /// Generation of the search that produced this event
    pub fn generation(&self) -> u64 {
        match self {
            SearchEvent::PhaseChanged { generation, .. }
            | SearchEvent::StatusChanged { generation, .. }
            | SearchEvent::CardCreated { generation, .. }
            | SearchEvent::CardImageResolved { generation, .. }
            | SearchEvent::CardImageUnavailable { generation, .. } => *generation,
        }
    }

    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            SearchEvent::PhaseChanged { .. } => "PhaseChanged",
            SearchEvent::StatusChanged { .. } => "StatusChanged",
            SearchEvent::CardCreated { .. } => "CardCreated",
            SearchEvent::CardImageResolved { .. } => "CardImageResolved",
            SearchEvent::CardImageUnavailable { .. } => "CardImageUnavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = SearchEvent::PhaseChanged {
            generation: 3,
            phase: SearchPhase::FetchingImages,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PhaseChanged");
        assert_eq!(json["generation"], 3);
        assert_eq!(json["phase"], "fetching_images");
    }

    #[test]
    fn test_status_without_hint_omits_field() {
        let event = SearchEvent::StatusChanged {
            generation: 1,
            message: "Done.".to_string(),
            is_error: false,
            hint: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("hint").is_none());
    }

    #[test]
    fn test_event_type_matches_serde_tag() {
        let event = SearchEvent::CardImageUnavailable {
            generation: 9,
            index: 0,
            reason: "Image unavailable".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
        assert_eq!(event.generation(), 9);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(SearchPhase::Done.is_terminal());
        assert!(SearchPhase::Empty.is_terminal());
        assert!(SearchPhase::Error.is_terminal());
        assert!(SearchPhase::Idle.is_terminal());
        assert!(!SearchPhase::FetchingEvents.is_terminal());
        assert!(!SearchPhase::FetchingImages.is_terminal());
    }
}
