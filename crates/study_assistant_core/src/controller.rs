//! crates/study_assistant_core/src/controller.rs
//!
//! The session controller. Owns the application state (open document, view
//! mode, material store, error notebook, result log, active quiz and flashcard
//! review) and sequences every user action.
//!
//! Generation calls are the only suspension points. The state lock is released
//! while the gateway works, and results are written back under the document id
//! captured when the request started, so a late reply never lands on whatever
//! document happens to be open at completion time. A busy flag admits one
//! generation at a time.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::analytics::{aggregate, AnalyticsPolicy, AnalyticsReport};
use crate::catalog::Catalog;
use crate::domain::{
    Flashcard, QuizFilters, QuizQuestion, QuizResult, SearchResults, SourceDocument,
    StudyMaterialRecord, ViewMode,
};
use crate::gateway::{GenerationGateway, QuizSource};
use crate::materials::MaterialStore;
use crate::notebook::{CategoryCount, ErrorNotebook, NotebookChange};
use crate::ports::{CompletionService, PortError, StudyStore};
use crate::quiz::{QuizSession, QuizStatus};
use crate::review::{Grade, Progress, RateOutcome, ReviewSession, ReviewState, ReviewTimings};

//=========================================================================================
// Errors and Outcomes
//=========================================================================================

/// Caller mistakes the host must report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudyError {
    #[error("Unknown document: {0}")]
    UnknownDocument(String),
    #[error("No quiz is in progress")]
    NoActiveQuiz,
    #[error("Option {index} is out of range for a question with {options} options")]
    InvalidOption { index: usize, options: usize },
}

/// What a summary, flashcard or mind map action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// A cached summary was reused and nothing was requested.
    Cached,
    /// The request completed with content.
    Generated,
    /// The request completed empty. The learner can retry.
    Empty,
    /// Another generation is in flight.
    Busy,
    NoActiveDocument,
}

impl GenerationOutcome {
    fn from_result(produced: bool) -> Self {
        if produced {
            GenerationOutcome::Generated
        } else {
            GenerationOutcome::Empty
        }
    }
}

/// Which quiz branch ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuizOutcome {
    /// Error review was requested with an empty notebook.
    NothingToReview,
    ErrorReview { questions: usize },
    General { questions: usize },
    Contextual { questions: usize },
    /// No specialty and no open document: nothing was requested.
    NoContext,
    Busy,
}

/// Feedback for an answered question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerFeedback {
    pub question_id: String,
    pub selected: usize,
    pub correct_index: usize,
    pub is_correct: bool,
    pub explanation: String,
    pub notebook_change: NotebookChange,
}

//=========================================================================================
// Read-only Views
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub mode: ViewMode,
    pub active_document_id: Option<String>,
    pub busy: bool,
    pub error_notebook_size: usize,
    pub quiz_status: QuizStatus,
    pub answered_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizView {
    pub status: QuizStatus,
    pub index: usize,
    pub total: usize,
    pub question: Option<QuizQuestion>,
    pub selected: Option<usize>,
    pub is_last: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewView {
    pub state: ReviewState,
    pub card: Option<Flashcard>,
    pub progress: Progress,
    /// (position + 1) / queue length. Requeues grow the denominator.
    pub fraction: f64,
    pub batch_size: usize,
    pub timings: ReviewTimings,
}

impl ReviewView {
    fn of(session: &ReviewSession) -> Self {
        let progress = session.progress();
        Self {
            state: session.state(),
            card: session.current_card().cloned(),
            progress,
            fraction: progress.fraction(),
            batch_size: session.batch_len(),
            timings: ReviewTimings::default(),
        }
    }
}

/// What has been generated for one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterialStatus {
    pub has_summary: bool,
    pub card_count: usize,
    pub has_mind_map: bool,
}

impl MaterialStatus {
    fn of(record: &StudyMaterialRecord) -> Self {
        Self {
            has_summary: record.summary.is_some(),
            card_count: record.flashcards.len(),
            has_mind_map: record.mind_map.is_some(),
        }
    }
}

//=========================================================================================
// State Container
//=========================================================================================

#[derive(Debug, Default)]
struct StudyState {
    mode: ViewMode,
    active_document_id: Option<String>,
    materials: MaterialStore,
    notebook: ErrorNotebook,
    results: Vec<QuizResult>,
    quiz: QuizSession,
    review: Option<ReviewSession>,
    last_search: Option<SearchResults>,
}

impl StudyState {
    /// Rebuilds the review session when the open document's batch changed.
    fn sync_review(&mut self) {
        let cards: &[Flashcard] = self
            .active_document_id
            .as_deref()
            .and_then(|id| self.materials.get(id))
            .map(|r| r.flashcards.as_slice())
            .unwrap_or(&[]);

        if cards.is_empty() {
            self.review = None;
            return;
        }
        let current = self.review.as_ref().is_some_and(|r| r.is_for_batch(cards));
        if !current {
            self.review = Some(ReviewSession::new(cards.to_vec()));
        }
    }
}

/// Clears the busy flag when a generation ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

//=========================================================================================
// The Controller
//=========================================================================================

pub struct StudyController {
    catalog: Arc<Catalog>,
    gateway: GenerationGateway,
    store: Arc<dyn StudyStore>,
    policy: AnalyticsPolicy,
    busy: AtomicBool,
    state: Mutex<StudyState>,
}

fn log_load_failure(what: &str, e: &PortError) {
    match e {
        PortError::NotFound(_) => info!("No saved {} found; starting empty.", what),
        _ => warn!("Could not load saved {}; starting empty: {}", what, e),
    }
}

impl StudyController {
    /// Builds the controller and restores persisted state.
    ///
    /// Load failures never abort startup: each collection falls back to empty.
    pub async fn load(
        catalog: Arc<Catalog>,
        completion: Arc<dyn CompletionService>,
        store: Arc<dyn StudyStore>,
        policy: AnalyticsPolicy,
    ) -> Self {
        let mut state = StudyState::default();

        match store.load_study_materials().await {
            Ok(records) => {
                info!("Restored study materials for {} document(s).", records.len());
                state.materials = MaterialStore::from_records(records);
            }
            Err(e) => log_load_failure("study materials", &e),
        }

        match store.load_error_notebook().await {
            Ok(questions) => {
                state.notebook = ErrorNotebook::from_questions(questions);
                info!("Restored {} error notebook question(s).", state.notebook.len());
            }
            Err(e) => log_load_failure("error notebook", &e),
        }

        if policy == AnalyticsPolicy::Persisted {
            match store.load_quiz_results().await {
                Ok(results) => {
                    info!("Restored {} quiz result(s).", results.len());
                    state.results = results;
                }
                Err(e) => log_load_failure("quiz results", &e),
            }
        }

        Self {
            catalog,
            gateway: GenerationGateway::new(completion),
            store,
            policy,
            busy: AtomicBool::new(false),
            state: Mutex::new(state),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn begin_generation(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    async fn active_document(&self) -> Option<&SourceDocument> {
        let id = self.state.lock().await.active_document_id.clone()?;
        self.catalog.get(&id)
    }

    //-------------------------------------------------------------------------------------
    // Persistence (best effort)
    //-------------------------------------------------------------------------------------

    async fn persist_materials(&self, state: &StudyState) {
        if let Err(e) = self.store.save_study_materials(state.materials.records()).await {
            error!("Failed to save study materials: {}", e);
        }
    }

    async fn persist_notebook(&self, state: &StudyState) {
        if let Err(e) = self.store.save_error_notebook(state.notebook.questions()).await {
            error!("Failed to save error notebook: {}", e);
        }
    }

    async fn persist_results(&self, state: &StudyState) {
        if self.policy != AnalyticsPolicy::Persisted {
            return;
        }
        if let Err(e) = self.store.save_quiz_results(&state.results).await {
            error!("Failed to save quiz results: {}", e);
        }
    }

    //-------------------------------------------------------------------------------------
    // Navigation
    //-------------------------------------------------------------------------------------

    /// Switches the view. Document views are refused while no document is open.
    pub async fn set_mode(&self, mode: ViewMode) -> bool {
        let mut state = self.state.lock().await;
        if mode.requires_document() && state.active_document_id.is_none() {
            debug!("Ignoring switch to {:?}: no document is open.", mode);
            return false;
        }
        state.mode = mode;
        true
    }

    /// Ends the (mocked) login session: closes the document and returns to the library.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        state.active_document_id = None;
        state.mode = ViewMode::Library;
        state.review = None;
    }

    /// Opens a document in the summary view, generating its summary unless one
    /// is already cached.
    pub async fn select_document(&self, document_id: &str) -> Result<GenerationOutcome, StudyError> {
        let document = self
            .catalog
            .get(document_id)
            .ok_or_else(|| StudyError::UnknownDocument(document_id.to_string()))?;

        {
            let mut state = self.state.lock().await;
            state.active_document_id = Some(document.id.clone());
            state.mode = ViewMode::Summary;
            state.sync_review();
            if state.materials.touch(&document.id, Utc::now()) && state.materials.has_summary(&document.id) {
                info!("Using cached summary for document {}.", document.id);
                self.persist_materials(&state).await;
                return Ok(GenerationOutcome::Cached);
            }
        }

        Ok(self.generate_summary_for(document).await)
    }

    /// Re-runs summary generation for the open document, ignoring the cache.
    pub async fn regenerate_summary(&self) -> GenerationOutcome {
        match self.active_document().await {
            Some(document) => self.generate_summary_for(document).await,
            None => GenerationOutcome::NoActiveDocument,
        }
    }

    async fn generate_summary_for(&self, document: &SourceDocument) -> GenerationOutcome {
        let Some(_guard) = self.begin_generation() else {
            warn!("Summary for document {} not requested: a generation is in flight.", document.id);
            return GenerationOutcome::Busy;
        };

        {
            let mut state = self.state.lock().await;
            state.materials.ensure(&document.id, Utc::now());
            self.persist_materials(&state).await;
        }

        info!("Generating summary for document {}.", document.id);
        let summary = self.gateway.summary(&document.transcript).await;
        let produced = summary.is_some();

        let mut state = self.state.lock().await;
        state.materials.set_summary(&document.id, summary, Utc::now());
        self.persist_materials(&state).await;
        GenerationOutcome::from_result(produced)
    }

    /// Generates a new flashcard batch for the open document, replacing the old one.
    pub async fn generate_flashcards(&self) -> GenerationOutcome {
        let Some(document) = self.active_document().await else {
            return GenerationOutcome::NoActiveDocument;
        };
        let Some(_guard) = self.begin_generation() else {
            return GenerationOutcome::Busy;
        };

        info!("Generating flashcards for document {}.", document.id);
        let cards = self.gateway.flashcards(&document.transcript).await;
        let produced = !cards.is_empty();

        let mut state = self.state.lock().await;
        state.materials.set_flashcards(&document.id, cards, Utc::now());
        state.sync_review();
        self.persist_materials(&state).await;
        GenerationOutcome::from_result(produced)
    }

    /// Generates a new mind map for the open document, replacing the old one.
    pub async fn generate_mind_map(&self) -> GenerationOutcome {
        let Some(document) = self.active_document().await else {
            return GenerationOutcome::NoActiveDocument;
        };
        let Some(_guard) = self.begin_generation() else {
            return GenerationOutcome::Busy;
        };

        info!("Generating mind map for document {}.", document.id);
        let map = self.gateway.mind_map(&document.transcript).await;
        let produced = map.is_some();

        let mut state = self.state.lock().await;
        state.materials.set_mind_map(&document.id, map, Utc::now());
        self.persist_materials(&state).await;
        GenerationOutcome::from_result(produced)
    }

    //-------------------------------------------------------------------------------------
    // Quiz
    //-------------------------------------------------------------------------------------

    /// Picks the quiz source in priority order: error notebook, specialty
    /// filters, then the open document.
    pub async fn generate_quiz(&self, filters: &QuizFilters, use_error_notebook: bool) -> QuizOutcome {
        if use_error_notebook {
            return self.start_error_review().await;
        }

        let context = if filters.has_specialty() {
            None
        } else {
            match self.active_document().await {
                Some(document) => Some(document),
                None => {
                    debug!("Quiz not requested: no specialty and no open document.");
                    return QuizOutcome::NoContext;
                }
            }
        };

        let Some(_guard) = self.begin_generation() else {
            return QuizOutcome::Busy;
        };

        let source = match context {
            None => {
                info!("Generating general quiz for specialty '{}'.", filters.specialty);
                QuizSource::General(filters)
            }
            Some(document) => {
                info!("Generating quiz from document {}.", document.id);
                QuizSource::Contextual {
                    transcript: &document.transcript,
                    filters,
                }
            }
        };
        let questions = self.gateway.quiz_questions(source).await;

        let count = questions.len();
        self.state.lock().await.quiz = QuizSession::new(questions);
        match source {
            QuizSource::General(_) => QuizOutcome::General { questions: count },
            QuizSource::Contextual { .. } => QuizOutcome::Contextual { questions: count },
        }
    }

    /// Starts a quiz over a shuffled copy of the error notebook.
    pub async fn start_error_review(&self) -> QuizOutcome {
        let mut state = self.state.lock().await;
        if state.notebook.is_empty() {
            info!("Error review requested with an empty notebook.");
            return QuizOutcome::NothingToReview;
        }
        let questions = state.notebook.shuffled(&mut rand::thread_rng());
        let count = questions.len();
        state.quiz = QuizSession::new(questions);
        state.mode = ViewMode::Quiz;
        QuizOutcome::ErrorReview { questions: count }
    }

    /// Answers the current question. `Ok(None)` means it was already answered.
    pub async fn answer_quiz(&self, option_index: usize) -> Result<Option<AnswerFeedback>, StudyError> {
        let mut state = self.state.lock().await;
        let options = state
            .quiz
            .current()
            .map(|q| q.options.len())
            .ok_or(StudyError::NoActiveQuiz)?;
        if state.quiz.is_answered() {
            debug!("Ignoring a second answer to question {}.", state.quiz.index());
            return Ok(None);
        }
        if option_index >= options {
            return Err(StudyError::InvalidOption {
                index: option_index,
                options,
            });
        }

        let Some(record) = state.quiz.answer(option_index, Utc::now()) else {
            return Ok(None);
        };
        let is_correct = record.result.is_correct;
        state.results.push(record.result);
        let change = state.notebook.record(&record.question, is_correct);

        if change.is_change() {
            self.persist_notebook(&state).await;
        }
        self.persist_results(&state).await;

        Ok(Some(AnswerFeedback {
            question_id: record.question.id,
            selected: record.selected,
            correct_index: record.question.correct_index,
            is_correct,
            explanation: record.question.explanation,
            notebook_change: change,
        }))
    }

    /// Advances to the next question. False when not allowed.
    pub async fn next_question(&self) -> bool {
        self.state.lock().await.quiz.next()
    }

    /// Clears the active quiz and shows analytics.
    pub async fn finish_quiz(&self) {
        let mut state = self.state.lock().await;
        state.quiz.finish();
        state.mode = ViewMode::Analytics;
    }

    //-------------------------------------------------------------------------------------
    // Flashcard Review
    //-------------------------------------------------------------------------------------

    pub async fn review(&self) -> Option<ReviewView> {
        self.state.lock().await.review.as_ref().map(ReviewView::of)
    }

    pub async fn review_flip(&self) -> Option<ReviewView> {
        let mut state = self.state.lock().await;
        let review = state.review.as_mut()?;
        review.flip();
        Some(ReviewView::of(review))
    }

    pub async fn review_reveal(&self) -> Option<ReviewView> {
        let mut state = self.state.lock().await;
        let review = state.review.as_mut()?;
        review.reveal_feedback();
        Some(ReviewView::of(review))
    }

    /// Rates the current card. `None` when there is no session or no rating is accepted.
    pub async fn review_rate(&self, grade: Grade) -> Option<RateOutcome> {
        let mut state = self.state.lock().await;
        let outcome = state.review.as_mut()?.rate(grade)?;
        if outcome.requeued {
            debug!("Card requeued for review later in this session.");
        }
        Some(outcome)
    }

    pub async fn review_restart(&self) -> Option<ReviewView> {
        let mut state = self.state.lock().await;
        let review = state.review.as_mut()?;
        review.restart();
        Some(ReviewView::of(review))
    }

    //-------------------------------------------------------------------------------------
    // Research
    //-------------------------------------------------------------------------------------

    /// Searches the library. `None` when the query is blank or a generation is in flight.
    pub async fn search(&self, query: &str) -> Option<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let Some(_guard) = self.begin_generation() else {
            return None;
        };

        info!("Searching the library for '{}'.", query);
        let results = self.gateway.search(query, self.catalog.documents()).await;
        self.state.lock().await.last_search = Some(results.clone());
        Some(results)
    }

    //-------------------------------------------------------------------------------------
    // Snapshots
    //-------------------------------------------------------------------------------------

    pub async fn snapshot(&self) -> StateSnapshot {
        let state = self.state.lock().await;
        StateSnapshot {
            mode: state.mode,
            active_document_id: state.active_document_id.clone(),
            busy: self.is_busy(),
            error_notebook_size: state.notebook.len(),
            quiz_status: state.quiz.status(),
            answered_questions: state.results.len(),
        }
    }

    pub async fn materials(&self, document_id: &str) -> Option<StudyMaterialRecord> {
        self.state.lock().await.materials.get(document_id).cloned()
    }

    /// Generation status per document id. Documents never opened are absent.
    pub async fn material_overview(&self) -> BTreeMap<String, MaterialStatus> {
        self.state
            .lock()
            .await
            .materials
            .records()
            .iter()
            .map(|(id, record)| (id.clone(), MaterialStatus::of(record)))
            .collect()
    }

    pub async fn quiz(&self) -> QuizView {
        let state = self.state.lock().await;
        QuizView {
            status: state.quiz.status(),
            index: state.quiz.index(),
            total: state.quiz.questions().len(),
            question: state.quiz.current().cloned(),
            selected: state.quiz.selected(),
            is_last: state.quiz.is_last(),
        }
    }

    pub async fn error_notebook(&self) -> Vec<QuizQuestion> {
        self.state.lock().await.notebook.questions().to_vec()
    }

    pub async fn error_notebook_by_category(&self) -> Vec<CategoryCount> {
        self.state.lock().await.notebook.counts_by_category()
    }

    pub async fn analytics(&self) -> AnalyticsReport {
        aggregate(&self.state.lock().await.results)
    }

    pub async fn last_search(&self) -> Option<SearchResults> {
        self.state.lock().await.last_search.clone()
    }
}
