//! crates/study_assistant_core/src/memory.rs
//!
//! A `StudyStore` that keeps everything in process memory. Used when no
//! database is configured, and by tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{QuizQuestion, QuizResult};
use crate::ports::{PortError, PortResult, StudyMaterials, StudyStore};

#[derive(Debug, Default)]
struct Slots {
    materials: Option<StudyMaterials>,
    notebook: Option<Vec<QuizQuestion>>,
    results: Option<Vec<QuizResult>>,
}

#[derive(Debug, Default)]
pub struct InMemoryStudyStore {
    slots: Mutex<Slots>,
}

impl InMemoryStudyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn loaded<T: Clone>(slot: &Option<T>, what: &str) -> PortResult<T> {
    slot.clone()
        .ok_or_else(|| PortError::NotFound(format!("no saved {}", what)))
}

#[async_trait]
impl StudyStore for InMemoryStudyStore {
    async fn load_study_materials(&self) -> PortResult<StudyMaterials> {
        loaded(&self.slots.lock().await.materials, "study materials")
    }

    async fn save_study_materials(&self, materials: &StudyMaterials) -> PortResult<()> {
        self.slots.lock().await.materials = Some(materials.clone());
        Ok(())
    }

    async fn load_error_notebook(&self) -> PortResult<Vec<QuizQuestion>> {
        loaded(&self.slots.lock().await.notebook, "error notebook")
    }

    async fn save_error_notebook(&self, questions: &[QuizQuestion]) -> PortResult<()> {
        self.slots.lock().await.notebook = Some(questions.to_vec());
        Ok(())
    }

    async fn load_quiz_results(&self) -> PortResult<Vec<QuizResult>> {
        loaded(&self.slots.lock().await.results, "quiz results")
    }

    async fn save_quiz_results(&self, results: &[QuizResult]) -> PortResult<()> {
        self.slots.lock().await.results = Some(results.to_vec());
        Ok(())
    }
}
