//! crates/study_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the study assistant core.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the concrete generation provider and storage engine.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::{QuizQuestion, QuizResult, StudyMaterialRecord};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Malformed data: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Generation Port
//=========================================================================================

/// The generation capabilities the gateway can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Summary,
    Flashcards,
    MindMap,
    Quiz,
    Search,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Summary => "summary",
            Capability::Flashcards => "flashcards",
            Capability::MindMap => "mindmap",
            Capability::Quiz => "quiz",
            Capability::Search => "search",
        }
    }
}

/// A single request to the external generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub capability: Capability,
    /// The task and its context (a truncated transcript, or filter parameters).
    pub prompt: String,
    /// A JSON schema describing the expected output shape.
    pub schema: serde_json::Value,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends the prompt and returns the raw text of the model's reply.
    async fn complete(&self, request: &CompletionRequest) -> PortResult<String>;
}

//=========================================================================================
// Persistence Port
//=========================================================================================

/// Every generated record, keyed by source document id.
pub type StudyMaterials = BTreeMap<String, StudyMaterialRecord>;

/// Best-effort storage for the state that outlives a process.
///
/// Loads return `PortError::NotFound` when nothing was ever saved.
#[async_trait]
pub trait StudyStore: Send + Sync {
    async fn load_study_materials(&self) -> PortResult<StudyMaterials>;

    async fn save_study_materials(&self, materials: &StudyMaterials) -> PortResult<()>;

    async fn load_error_notebook(&self) -> PortResult<Vec<QuizQuestion>>;

    async fn save_error_notebook(&self, questions: &[QuizQuestion]) -> PortResult<()>;

    async fn load_quiz_results(&self) -> PortResult<Vec<QuizResult>>;

    async fn save_quiz_results(&self, results: &[QuizResult]) -> PortResult<()>;
}
