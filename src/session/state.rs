//! Session state owned by the controller

use serde::Serialize;
use std::collections::HashMap;

use crate::catalog::{self, SelectionKey, SpaceVariant, StyleVariant};
use crate::generation::GeneratedImage;

/// Where the most recent generation request stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Pending,
    Resolved,
    Failed,
}

/// Why the last generation failed. Diagnostics only; views show `last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    Generation,
    EmptyResult,
    /// The request was abandoned before a response arrived.
    Interrupted,
}

impl FailureKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::Configuration => "API key not found in environment.",
            FailureKind::Generation => "Something went wrong, please try again later.",
            FailureKind::EmptyResult => "No image produced, please try again.",
            FailureKind::Interrupted => "Rendering was interrupted, please try again.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub selected_space: &'static SpaceVariant,
    pub selected_style: &'static StyleVariant,
    /// Renderings generated this session; entries are only added or replaced
    pub images: HashMap<SelectionKey, GeneratedImage>,
    pub is_busy: bool,
    pub last_error: Option<String>,
    pub last_failure: Option<FailureKind>,
    pub phase: Phase,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            selected_space: catalog::default_space(),
            selected_style: catalog::default_style(),
            images: HashMap::new(),
            is_busy: false,
            last_error: None,
            last_failure: None,
            phase: Phase::Idle,
        }
    }

    pub fn selection_key(&self) -> SelectionKey {
        SelectionKey::new(self.selected_space, self.selected_style)
    }

    pub fn current_image(&self) -> Option<&GeneratedImage> {
        self.images.get(&self.selection_key())
    }

    pub(super) fn fail(&mut self, kind: FailureKind) {
        self.last_error = Some(kind.user_message().to_string());
        self.last_failure = Some(kind);
        self.phase = Phase::Failed;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the session for rendering surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub space_id: &'static str,
    pub space_name: &'static str,
    pub style_id: &'static str,
    pub style_name: &'static str,
    pub key: SelectionKey,
    pub has_image: bool,
    pub is_busy: bool,
    pub phase: Phase,
    pub last_error: Option<String>,
    pub last_failure: Option<FailureKind>,
    /// Keys with a cached rendering, sorted
    pub cached: Vec<SelectionKey>,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        let mut cached: Vec<SelectionKey> = state.images.keys().cloned().collect();
        cached.sort();

        Self {
            space_id: state.selected_space.id,
            space_name: state.selected_space.name,
            style_id: state.selected_style.id,
            style_name: state.selected_style.name,
            key: state.selection_key(),
            has_image: state.current_image().is_some(),
            is_busy: state.is_busy,
            phase: state.phase,
            last_error: state.last_error.clone(),
            last_failure: state.last_failure,
            cached,
        }
    }
}
