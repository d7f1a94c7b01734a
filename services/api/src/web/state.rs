//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;
use study_assistant_core::StudyController;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<StudyController>,
}

impl AppState {
    pub fn new(controller: StudyController) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }
}
