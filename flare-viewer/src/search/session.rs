//! Per-session search generations
//!
//! Every browser session may have at most one live search. Starting a new
//! search bumps the session's generation; a [`SearchContext`] only emits while
//! its generation is still current, so updates from a replaced search are
//! discarded instead of reaching the page.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

use flare_common::{FlareCard, SearchEvent, SearchPhase};

use crate::resolver::ImageLocator;

/// Why a search stopped before finishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchCancelled {
    #[error("superseded by a newer search")]
    Superseded,

    #[error("client disconnected")]
    Disconnected,
}

/// Tracks the current search generation of each browser session
#[derive(Clone, Default)]
pub struct SearchRegistry {
    /// Generations are unique across all sessions and never reused
    next_generation: Arc<AtomicU64>,
    current: Arc<RwLock<HashMap<Uuid, u64>>>,
}

impl SearchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search for `session`, superseding any running one
    pub async fn begin(&self, session: Uuid, tx: mpsc::Sender<SearchEvent>) -> SearchContext {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.current.write().await.insert(session, generation);

        if let Some(previous) = previous {
            debug!(%session, previous, generation, "Superseding running search");
        }

        SearchContext {
            session,
            generation,
            registry: self.clone(),
            tx,
        }
    }

    /// Generation to stamp on events that must not supersede anything
    ///
    /// The session's running search keeps its generation; an idle session
    /// gets a fresh, unregistered one.
    pub async fn peek_generation(&self, session: Uuid) -> u64 {
        if let Some(generation) = self.current.read().await.get(&session) {
            return *generation;
        }
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn is_current(&self, session: Uuid, generation: u64) -> bool {
        self.current.read().await.get(&session) == Some(&generation)
    }

    /// Forget `session` if `generation` is still its latest search
    pub async fn finish(&self, session: Uuid, generation: u64) {
        let mut current = self.current.write().await;
        if current.get(&session) == Some(&generation) {
            current.remove(&session);
        }
    }

    /// Number of sessions with a search in flight
    pub async fn active_sessions(&self) -> usize {
        self.current.read().await.len()
    }
}

/// Emitter for one search
pub struct SearchContext {
    session: Uuid,
    generation: u64,
    registry: SearchRegistry,
    tx: mpsc::Sender<SearchEvent>,
}

impl SearchContext {
    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Send an event unless this search has been superseded or abandoned
    pub async fn emit(&self, event: SearchEvent) -> Result<(), SearchCancelled> {
        if !self.registry.is_current(self.session, self.generation).await {
            debug!(
                generation = self.generation,
                event = event.event_type(),
                "Discarding stale search event"
            );
            return Err(SearchCancelled::Superseded);
        }

        self.tx
            .send(event)
            .await
            .map_err(|_| SearchCancelled::Disconnected)
    }

    pub async fn phase(&self, phase: SearchPhase) -> Result<(), SearchCancelled> {
        self.emit(SearchEvent::PhaseChanged {
            generation: self.generation,
            phase,
        })
        .await
    }

    pub async fn status(
        &self,
        message: impl Into<String>,
        is_error: bool,
    ) -> Result<(), SearchCancelled> {
        self.status_with_hint(message, is_error, None).await
    }

    pub async fn status_with_hint(
        &self,
        message: impl Into<String>,
        is_error: bool,
        hint: Option<String>,
    ) -> Result<(), SearchCancelled> {
        self.emit(SearchEvent::StatusChanged {
            generation: self.generation,
            message: message.into(),
            is_error,
            hint,
        })
        .await
    }

    pub async fn card_created(&self, index: usize, card: FlareCard) -> Result<(), SearchCancelled> {
        self.emit(SearchEvent::CardCreated {
            generation: self.generation,
            index,
            card,
        })
        .await
    }

    pub async fn image_resolved(
        &self,
        index: usize,
        locator: &ImageLocator,
    ) -> Result<(), SearchCancelled> {
        self.emit(SearchEvent::CardImageResolved {
            generation: self.generation,
            index,
            image_url: locator.download_url.clone(),
            wavelength: locator.wavelength.clone(),
        })
        .await
    }

    pub async fn image_unavailable(
        &self,
        index: usize,
        reason: impl Into<String>,
    ) -> Result<(), SearchCancelled> {
        self.emit(SearchEvent::CardImageUnavailable {
            generation: self.generation,
            index,
            reason: reason.into(),
        })
        .await
    }

    /// Release the session slot if this search is still the latest
    pub async fn finish(&self) {
        self.registry.finish(self.session, self.generation).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generations_increase_per_search() {
        let registry = SearchRegistry::new();
        let session = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(8);

        let first = registry.begin(session, tx.clone()).await;
        let second = registry.begin(session, tx).await;

        assert!(second.generation() > first.generation());
        assert!(!registry.is_current(session, first.generation()).await);
        assert!(registry.is_current(session, second.generation()).await);
    }

    #[tokio::test]
    async fn test_superseded_context_discards_events() {
        let registry = SearchRegistry::new();
        let session = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(8);

        let old = registry.begin(session, tx.clone()).await;
        let new = registry.begin(session, tx).await;

        assert_eq!(old.phase(SearchPhase::Done).await, Err(SearchCancelled::Superseded));
        assert_eq!(new.phase(SearchPhase::Done).await, Ok(()));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.generation(), new.generation());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let registry = SearchRegistry::new();
        let (tx, _rx) = mpsc::channel(8);

        let a = registry.begin(Uuid::new_v4(), tx.clone()).await;
        let b = registry.begin(Uuid::new_v4(), tx).await;

        assert!(registry.is_current(a.session(), a.generation()).await);
        assert!(registry.is_current(b.session(), b.generation()).await);
        assert_eq!(registry.active_sessions().await, 2);
    }

    #[tokio::test]
    async fn test_dropped_receiver_reports_disconnect() {
        let registry = SearchRegistry::new();
        let (tx, rx) = mpsc::channel(8);
        let ctx = registry.begin(Uuid::new_v4(), tx).await;
        drop(rx);

        assert_eq!(ctx.status("x", false).await, Err(SearchCancelled::Disconnected));
    }

    #[tokio::test]
    async fn test_finish_only_releases_latest() {
        let registry = SearchRegistry::new();
        let session = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(8);

        let old = registry.begin(session, tx.clone()).await;
        let new = registry.begin(session, tx).await;

        old.finish().await;
        assert!(registry.is_current(session, new.generation()).await);

        new.finish().await;
        assert_eq!(registry.active_sessions().await, 0);
        // Once released, even the last generation no longer emits
        assert_eq!(new.status("late", false).await, Err(SearchCancelled::Superseded));
    }

    #[tokio::test]
    async fn test_peek_generation_never_supersedes() {
        let registry = SearchRegistry::new();
        let session = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(8);

        let idle = registry.peek_generation(session).await;
        assert_eq!(registry.active_sessions().await, 0);

        let running = registry.begin(session, tx).await;
        assert!(running.generation() > idle);
        assert_eq!(registry.peek_generation(session).await, running.generation());
        assert!(running.status("still here", false).await.is_ok());
    }
}
