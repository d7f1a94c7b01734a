//! crates/study_assistant_core/src/domain.rs
//!
//! Defines the core data structures for the study assistant.
//! These types derive `serde` traits because both the persistence port and the
//! generation gateway exchange them as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Content Catalog Types
//=========================================================================================

/// The kind of media a lecture was recorded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Video,
    Pdf,
    Text,
}

/// A lecture transcript loaded once at startup. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub name: String,
    pub subject_area: String,
    pub media_type: MediaType,
    pub date: String,
    #[serde(default)]
    pub transcript: String,
}

//=========================================================================================
// Generated Study Materials
//=========================================================================================

/// The kind of a summary section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Concept,
    Clinical,
    Diagnosis,
    Treatment,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySection {
    pub kind: SectionKind,
    pub title: String,
    pub content: Vec<String>,
}

/// A structured lecture summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    pub topic: String,
    pub sections: Vec<SummarySection>,
    pub exam_pearls: Vec<String>,
}

/// Informational only; review sessions requeue through their own queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashcardStatus {
    #[default]
    New,
    Learning,
    Mastered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub status: FlashcardStatus,
}

/// A node of a generated mind map.
///
/// Children are owned values, so a map is always a tree: a node can never point
/// back at one of its ancestors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::node_count).sum::<usize>()
    }

    /// Depth of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::depth).max().unwrap_or(0)
    }
}

/// A multiple choice question. Identity (and notebook equality) is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub institution: Option<String>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

/// The per-document cache of generated materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyMaterialRecord {
    pub document_id: String,
    pub summary: Option<Summary>,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
    pub mind_map: Option<MindMapNode>,
    #[serde(default)]
    pub quiz_questions: Vec<QuizQuestion>,
    pub last_accessed: DateTime<Utc>,
}

impl StudyMaterialRecord {
    /// A record with every material field empty.
    pub fn empty(document_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            document_id: document_id.into(),
            summary: None,
            flashcards: Vec::new(),
            mind_map: None,
            quiz_questions: Vec::new(),
            last_accessed: now,
        }
    }
}

//=========================================================================================
// Quiz Configuration and Results
//=========================================================================================

/// The filters picked on the quiz configuration screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizFilters {
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default = "default_question_count")]
    pub count: usize,
}

fn default_question_count() -> usize {
    crate::gateway::DEFAULT_QUESTION_COUNT
}

impl Default for QuizFilters {
    fn default() -> Self {
        Self {
            specialty: String::new(),
            institution: String::new(),
            difficulty: String::new(),
            count: default_question_count(),
        }
    }
}

impl QuizFilters {
    /// A specialty makes the request a general one, detached from any document.
    pub fn has_specialty(&self) -> bool {
        !self.specialty.trim().is_empty()
    }
}

/// One answered question. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub category: String,
    pub is_correct: bool,
    pub timestamp: DateTime<Utc>,
}

/// The answer of the Research capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub explanation: String,
    pub relevant_document_ids: Vec<String>,
}

//=========================================================================================
// View Modes
//=========================================================================================

/// The view currently shown to the learner. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Library,
    Summary,
    Flashcards,
    MindMap,
    Quiz,
    Analytics,
    Research,
    Errors,
}

impl ViewMode {
    /// Modes that only make sense with an open document.
    pub fn requires_document(self) -> bool {
        matches!(self, ViewMode::Summary | ViewMode::Flashcards | ViewMode::MindMap)
    }
}
