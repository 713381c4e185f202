//! Generation session controller
//!
//! Owns the visualizer state (selection, rendering cache, busy latch, last
//! error) and sequences generate commands against an `ImageGenerator`.
//! One request at most is in flight per controller; a trigger while busy is
//! dropped, not queued. The cache slot a response is written to is fixed when
//! the request is issued, so switching rooms mid-request is safe.

mod state;

pub use state::{FailureKind, Phase, SessionSnapshot, SessionState};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::catalog::{self, CatalogError, SelectionKey, SpaceVariant, StyleVariant};
use crate::generation::{GeneratedImage, ImageGenerator};

/// Result of a generate command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A request was already in flight; nothing happened.
    Ignored,
    Resolved {
        key: SelectionKey,
    },
    Failed {
        key: SelectionKey,
        kind: FailureKind,
        message: String,
    },
}

pub struct SessionController {
    generator: Arc<dyn ImageGenerator>,
    state: Mutex<SessionState>,
}

impl SessionController {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            generator,
            state: Mutex::new(SessionState::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    pub fn select_space(&self, id: &str) -> Result<(), CatalogError> {
        let space = catalog::find_space(id)?;
        self.lock().selected_space = space;
        debug!("Selected space {}", id);
        Ok(())
    }

    pub fn select_style(&self, id: &str) -> Result<(), CatalogError> {
        let style = catalog::find_style(id)?;
        self.lock().selected_style = style;
        debug!("Selected style {}", id);
        Ok(())
    }

    pub fn selection(&self) -> (&'static SpaceVariant, &'static StyleVariant) {
        let state = self.lock();
        (state.selected_space, state.selected_style)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&*self.lock())
    }

    /// Cached rendering for the active selection.
    pub fn current_image(&self) -> Option<GeneratedImage> {
        self.lock().current_image().cloned()
    }

    pub fn image_for(&self, key: &SelectionKey) -> Option<GeneratedImage> {
        self.lock().images.get(key).cloned()
    }

    /// Render the active selection and cache the result under its key.
    pub async fn trigger_generation(&self) -> GenerationOutcome {
        let (key, prompt) = {
            let mut state = self.lock();
            if state.is_busy {
                debug!("Generation already in flight, ignoring trigger");
                return GenerationOutcome::Ignored;
            }
            state.is_busy = true;
            state.last_error = None;
            state.last_failure = None;
            state.phase = Phase::Pending;
            (
                state.selection_key(),
                catalog::compose_prompt(state.selected_space, state.selected_style),
            )
        };

        info!("Generating rendering for {}", key);
        let in_flight = InFlight {
            state: &self.state,
            key: &key,
        };
        let result = self.generator.generate(&prompt).await;
        std::mem::forget(in_flight);

        let mut state = self.lock();
        state.is_busy = false;

        let kind = match result {
            Ok(Some(image)) => {
                info!("Rendering ready for {} ({})", key, image.mime_type);
                state.images.insert(key.clone(), image);
                state.phase = Phase::Resolved;
                return GenerationOutcome::Resolved { key };
            }
            Ok(None) => {
                warn!("No image part in response for {}", key);
                FailureKind::EmptyResult
            }
            Err(e) => {
                warn!("Generation for {} failed: {}", key, e);
                if e.is_configuration() {
                    FailureKind::Configuration
                } else {
                    FailureKind::Generation
                }
            }
        };

        state.fail(kind);
        GenerationOutcome::Failed {
            key,
            kind,
            message: kind.user_message().to_string(),
        }
    }
}

// Every critical section leaves the state consistent, so a poisoned
// lock is still safe to read.
fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the busy latch if a trigger future is dropped before its
/// response arrives. Forgotten once the response is in hand.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    key: &'a SelectionKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        warn!("Generation for {} was dropped before completing", self.key);
        let mut state = lock_state(self.state);
        state.is_busy = false;
        state.fail(FailureKind::Interrupted);
    }
}
