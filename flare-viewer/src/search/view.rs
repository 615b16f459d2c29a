//! Results display state
//!
//! [`ResultsView`] is the display list the page renders: status line, result
//! hint and one card per flare. It is built by applying [`SearchEvent`]s in
//! arrival order, the same reduction `ui/app.js` performs on the DOM.
//!
//! Generation rules:
//! - an event from an older generation than the newest seen is discarded
//! - an event from a newer generation adopts that generation
//! - the card list is reset when a search enters `FetchingEvents`, so a
//!   search that fails validation leaves earlier results on screen

use flare_common::{FlareCard, SearchEvent, SearchPhase};

/// Image slot of a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardImage {
    /// Spinner placeholder
    Pending,
    Resolved { url: String, wavelength: String },
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub card: FlareCard,
    pub image: CardImage,
}

#[derive(Debug, Clone)]
pub struct ResultsView {
    generation: Option<u64>,
    pub phase: SearchPhase,
    pub status: String,
    pub status_is_error: bool,
    pub hint: Option<String>,
    pub cards: Vec<CardView>,
}

impl Default for ResultsView {
    fn default() -> Self {
        Self {
            generation: None,
            phase: SearchPhase::Idle,
            status: String::new(),
            status_is_error: false,
            hint: None,
            cards: Vec::new(),
        }
    }
}

impl ResultsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the newest search applied so far
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// Apply one event; returns `false` if it was discarded
    pub fn apply(&mut self, event: &SearchEvent) -> bool {
        let generation = event.generation();
        match self.generation {
            Some(current) if generation < current => return false,
            _ => self.generation = Some(generation),
        }

        match event {
            SearchEvent::PhaseChanged { phase, .. } => {
                if *phase == SearchPhase::FetchingEvents {
                    self.cards.clear();
                    self.hint = None;
                }
                self.phase = *phase;
                true
            }
            SearchEvent::StatusChanged {
                message,
                is_error,
                hint,
                ..
            } => {
                self.status = message.clone();
                self.status_is_error = *is_error;
                if hint.is_some() {
                    self.hint = hint.clone();
                }
                true
            }
            SearchEvent::CardCreated { index, card, .. } => {
                let view = CardView {
                    card: card.clone(),
                    image: CardImage::Pending,
                };
                if *index == self.cards.len() {
                    self.cards.push(view);
                    true
                } else if let Some(slot) = self.cards.get_mut(*index) {
                    *slot = view;
                    true
                } else {
                    false
                }
            }
            SearchEvent::CardImageResolved {
                index,
                image_url,
                wavelength,
                ..
            } => self.set_image(
                *index,
                CardImage::Resolved {
                    url: image_url.clone(),
                    wavelength: wavelength.clone(),
                },
            ),
            SearchEvent::CardImageUnavailable { index, .. } => {
                self.set_image(*index, CardImage::Unavailable)
            }
        }
    }

    /// "Clear" action: drop displayed results and status text
    pub fn clear(&mut self) {
        self.cards.clear();
        self.hint = None;
        self.status.clear();
        self.status_is_error = false;
    }

    /// Cards whose image is still loading
    pub fn pending_cards(&self) -> usize {
        self.cards
            .iter()
            .filter(|c| c.image == CardImage::Pending)
            .count()
    }

    fn set_image(&mut self, index: usize, image: CardImage) -> bool {
        match self.cards.get_mut(index) {
            Some(card) => {
                card.image = image;
                true
            }
            None => false,
        }
    }
}
