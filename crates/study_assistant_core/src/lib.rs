pub mod analytics;
pub mod catalog;
pub mod controller;
pub mod domain;
pub mod gateway;
pub mod materials;
pub mod memory;
pub mod notebook;
pub mod parsing;
pub mod ports;
pub mod quiz;
pub mod review;

pub use analytics::{AnalyticsPolicy, AnalyticsReport, CategoryScore};
pub use catalog::Catalog;
pub use controller::{
    AnswerFeedback, GenerationOutcome, MaterialStatus, QuizOutcome, QuizView, ReviewView, StateSnapshot,
    StudyController, StudyError,
};
pub use domain::{
    Flashcard, MindMapNode, QuizFilters, QuizQuestion, QuizResult, SearchResults, SourceDocument,
    StudyMaterialRecord, Summary, ViewMode,
};
pub use gateway::GenerationGateway;
pub use memory::InMemoryStudyStore;
pub use notebook::{CategoryCount, NotebookChange};
pub use ports::{
    Capability, CompletionRequest, CompletionService, PortError, PortResult, StudyMaterials,
    StudyStore,
};
pub use review::{Grade, RateOutcome, ReviewTimings};
