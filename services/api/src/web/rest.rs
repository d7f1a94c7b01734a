//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Handlers that reach the generation service run the controller call on a
//! spawned task, so a client that disconnects mid-request does not abandon a
//! half-finished generation.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use study_assistant_core::{
    GenerationOutcome, Grade, QuizFilters, QuizOutcome, SourceDocument, StudyError, ViewMode,
};
use tracing::{error, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

type ApiResult<T> = Result<T, (StatusCode, String)>;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_documents_handler,
        select_document_handler,
        get_materials_handler,
        get_state_handler,
        set_mode_handler,
        logout_handler,
        regenerate_summary_handler,
        generate_flashcards_handler,
        generate_mind_map_handler,
        get_review_handler,
        review_flip_handler,
        review_reveal_handler,
        review_rate_handler,
        review_restart_handler,
        generate_quiz_handler,
        get_quiz_handler,
        answer_quiz_handler,
        next_question_handler,
        finish_quiz_handler,
        get_notebook_handler,
        review_notebook_handler,
        get_analytics_handler,
        research_handler,
    ),
    components(
        schemas(
            DocumentEntry, LibraryResponse, GenerationResponse, SetModeRequest,
            RateRequest, QuizRequest, AnswerRequest, NextResponse, ResearchRequest
        )
    ),
    tags(
        (name = "Study Assistant API", description = "API endpoints for the residency study assistant.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A library entry. Transcripts are not sent to the client.
#[derive(Serialize, ToSchema)]
pub struct DocumentEntry {
    id: String,
    name: String,
    subject_area: String,
    media_type: String,
    date: String,
    has_summary: bool,
    card_count: usize,
    has_mind_map: bool,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LibraryQuery {
    /// Only list documents of this subject area.
    subject: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LibraryResponse {
    subject_areas: Vec<String>,
    documents: Vec<DocumentEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct GenerationResponse {
    #[schema(value_type = String, example = "generated")]
    outcome: GenerationOutcome,
}

#[derive(Deserialize, ToSchema)]
pub struct SetModeRequest {
    #[schema(value_type = String, example = "analytics")]
    mode: ViewMode,
}

#[derive(Deserialize, ToSchema)]
pub struct RateRequest {
    #[schema(value_type = String, example = "good")]
    grade: Grade,
}

/// Quiz configuration. A non-blank specialty selects a general quiz; otherwise
/// the open document is used.
#[derive(Deserialize, ToSchema)]
pub struct QuizRequest {
    #[serde(default)]
    specialty: String,
    #[serde(default)]
    institution: String,
    #[serde(default)]
    difficulty: String,
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    use_error_notebook: bool,
}

impl QuizRequest {
    fn filters(&self) -> QuizFilters {
        let mut filters = QuizFilters {
            specialty: self.specialty.clone(),
            institution: self.institution.clone(),
            difficulty: self.difficulty.clone(),
            ..QuizFilters::default()
        };
        if let Some(count) = self.count {
            filters.count = count;
        }
        filters
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AnswerRequest {
    option_index: usize,
}

#[derive(Serialize, ToSchema)]
pub struct NextResponse {
    advanced: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct ResearchRequest {
    query: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Runs a controller call to completion even if the request is dropped.
async fn run_detached<F, T>(task: F) -> ApiResult<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(task).await.map_err(|e| {
        error!("Controller task failed: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    })
}

fn study_error(e: StudyError) -> (StatusCode, String) {
    let status = match e {
        StudyError::UnknownDocument(_) => StatusCode::NOT_FOUND,
        StudyError::NoActiveQuiz => StatusCode::CONFLICT,
        StudyError::InvalidOption { .. } => StatusCode::BAD_REQUEST,
    };
    (status, e.to_string())
}

fn generation_response(outcome: GenerationOutcome) -> ApiResult<Json<GenerationResponse>> {
    match outcome {
        GenerationOutcome::Busy => Err((
            StatusCode::CONFLICT,
            "Another generation is in progress".to_string(),
        )),
        GenerationOutcome::NoActiveDocument => {
            Err((StatusCode::CONFLICT, "No document is open".to_string()))
        }
        outcome => Ok(Json(GenerationResponse { outcome })),
    }
}

fn quiz_response(outcome: QuizOutcome) -> ApiResult<Json<QuizOutcome>> {
    match outcome {
        QuizOutcome::Busy => Err((
            StatusCode::CONFLICT,
            "Another generation is in progress".to_string(),
        )),
        outcome => Ok(Json(outcome)),
    }
}

fn no_review() -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        "No flashcards to review for the open document".to_string(),
    )
}

//=========================================================================================
// Library and Navigation
//=========================================================================================

/// List the document library.
///
/// `subject` restricts the list to one subject area.
#[utoipa::path(
    get,
    path = "/documents",
    params(LibraryQuery),
    responses((status = 200, description = "The library", body = LibraryResponse))
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<LibraryQuery>,
) -> impl IntoResponse {
    let controller = &app_state.controller;
    let overview = controller.material_overview().await;
    let catalog = controller.catalog();

    let documents: Vec<&SourceDocument> = match query.subject.as_deref().map(str::trim) {
        Some(area) if !area.is_empty() => catalog.by_subject(area).collect(),
        _ => catalog.documents().iter().collect(),
    };

    let documents = documents
        .into_iter()
        .map(|d| {
            let status = overview.get(&d.id).copied().unwrap_or_default();
            DocumentEntry {
                id: d.id.clone(),
                name: d.name.clone(),
                subject_area: d.subject_area.clone(),
                media_type: serde_json::to_value(d.media_type)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
                date: d.date.clone(),
                has_summary: status.has_summary,
                card_count: status.card_count,
                has_mind_map: status.has_mind_map,
            }
        })
        .collect();

    Json(LibraryResponse {
        subject_areas: catalog.subject_areas().into_iter().map(str::to_string).collect(),
        documents,
    })
}

/// Open a document in the summary view.
///
/// Generates the summary unless one is already cached. The document is opened
/// even when generation is refused because another one is in flight.
#[utoipa::path(
    post,
    path = "/documents/{id}/select",
    params(("id" = String, Path, description = "The document id.")),
    responses(
        (status = 200, description = "Document opened", body = GenerationResponse),
        (status = 404, description = "Unknown document"),
        (status = 409, description = "Document opened in the summary view, but its summary was not generated because another generation is in progress. Retry with POST /summary/regenerate.")
    )
)]
pub async fn select_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<GenerationResponse>> {
    let controller = app_state.controller.clone();
    let outcome = run_detached(async move { controller.select_document(&id).await })
        .await?
        .map_err(study_error)?;
    if outcome == GenerationOutcome::Busy {
        return Err((
            StatusCode::CONFLICT,
            "Document opened; its summary was not generated because another generation is in progress".to_string(),
        ));
    }
    generation_response(outcome)
}

/// Get the stored materials of a document.
#[utoipa::path(
    get,
    path = "/materials/{id}",
    params(("id" = String, Path, description = "The document id.")),
    responses(
        (status = 200, description = "Study material record", body = Object),
        (status = 404, description = "Nothing was generated for this document")
    )
)]
pub async fn get_materials_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    app_state
        .controller
        .materials(&id)
        .await
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No materials for document {}", id)))
}

/// Get the session state.
#[utoipa::path(
    get,
    path = "/state",
    responses((status = 200, description = "Session snapshot", body = Object))
)]
pub async fn get_state_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app_state.controller.snapshot().await)
}

/// Switch the active view.
#[utoipa::path(
    put,
    path = "/state/mode",
    request_body = SetModeRequest,
    responses(
        (status = 200, description = "View switched", body = Object),
        (status = 409, description = "The view needs an open document")
    )
)]
pub async fn set_mode_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SetModeRequest>,
) -> ApiResult<impl IntoResponse> {
    let controller = &app_state.controller;
    if !controller.set_mode(payload.mode).await {
        return Err((
            StatusCode::CONFLICT,
            "Open a document before switching to this view".to_string(),
        ));
    }
    Ok(Json(controller.snapshot().await))
}

/// End the session and return to the library.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout_handler(State(app_state): State<Arc<AppState>>) -> StatusCode {
    app_state.controller.logout().await;
    StatusCode::NO_CONTENT
}

//=========================================================================================
// Material Generation
//=========================================================================================

/// Regenerate the summary of the open document.
#[utoipa::path(
    post,
    path = "/summary/regenerate",
    responses(
        (status = 200, description = "Generation finished", body = GenerationResponse),
        (status = 409, description = "No open document, or another generation is in progress")
    )
)]
pub async fn regenerate_summary_handler(
    State(app_state): State<Arc<AppState>>,
) -> ApiResult<Json<GenerationResponse>> {
    let controller = app_state.controller.clone();
    generation_response(run_detached(async move { controller.regenerate_summary().await }).await?)
}

/// Generate a new flashcard batch for the open document.
#[utoipa::path(
    post,
    path = "/flashcards",
    responses(
        (status = 200, description = "Generation finished", body = GenerationResponse),
        (status = 409, description = "No open document, or another generation is in progress")
    )
)]
pub async fn generate_flashcards_handler(
    State(app_state): State<Arc<AppState>>,
) -> ApiResult<Json<GenerationResponse>> {
    let controller = app_state.controller.clone();
    generation_response(run_detached(async move { controller.generate_flashcards().await }).await?)
}

/// Generate a new mind map for the open document.
#[utoipa::path(
    post,
    path = "/mindmap",
    responses(
        (status = 200, description = "Generation finished", body = GenerationResponse),
        (status = 409, description = "No open document, or another generation is in progress")
    )
)]
pub async fn generate_mind_map_handler(
    State(app_state): State<Arc<AppState>>,
) -> ApiResult<Json<GenerationResponse>> {
    let controller = app_state.controller.clone();
    generation_response(run_detached(async move { controller.generate_mind_map().await }).await?)
}

//=========================================================================================
// Flashcard Review
//=========================================================================================

/// Get the review session of the open document.
#[utoipa::path(
    get,
    path = "/review",
    responses(
        (status = 200, description = "Review session", body = Object),
        (status = 404, description = "No flashcards to review")
    )
)]
pub async fn get_review_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    app_state.controller.review().await.map(Json).ok_or_else(no_review)
}

/// Turn the current card over.
#[utoipa::path(
    post,
    path = "/review/flip",
    responses(
        (status = 200, description = "Review session", body = Object),
        (status = 404, description = "No flashcards to review")
    )
)]
pub async fn review_flip_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    app_state.controller.review_flip().await.map(Json).ok_or_else(no_review)
}

/// Show the rating controls for a flipped card.
#[utoipa::path(
    post,
    path = "/review/reveal",
    responses(
        (status = 200, description = "Review session", body = Object),
        (status = 404, description = "No flashcards to review")
    )
)]
pub async fn review_reveal_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    app_state.controller.review_reveal().await.map(Json).ok_or_else(no_review)
}

/// Rate the current card.
#[utoipa::path(
    post,
    path = "/review/rate",
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rating applied", body = Object),
        (status = 409, description = "No card is waiting for a rating")
    )
)]
pub async fn review_rate_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RateRequest>,
) -> ApiResult<impl IntoResponse> {
    app_state
        .controller
        .review_rate(payload.grade)
        .await
        .map(Json)
        .ok_or_else(|| (StatusCode::CONFLICT, "No card is waiting for a rating".to_string()))
}

/// Start the review over from the original batch.
#[utoipa::path(
    post,
    path = "/review/restart",
    responses(
        (status = 200, description = "Review session", body = Object),
        (status = 404, description = "No flashcards to review")
    )
)]
pub async fn review_restart_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    app_state.controller.review_restart().await.map(Json).ok_or_else(no_review)
}

//=========================================================================================
// Quiz
//=========================================================================================

/// Start a quiz.
///
/// The error notebook takes priority when requested; otherwise a specialty
/// selects a general quiz and a blank specialty uses the open document.
#[utoipa::path(
    post,
    path = "/quiz",
    request_body = QuizRequest,
    responses(
        (status = 200, description = "Which quiz source was used", body = Object),
        (status = 409, description = "Another generation is in progress")
    )
)]
pub async fn generate_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<QuizRequest>,
) -> ApiResult<Json<QuizOutcome>> {
    let controller = app_state.controller.clone();
    let filters = payload.filters();
    let use_error_notebook = payload.use_error_notebook;
    quiz_response(
        run_detached(async move { controller.generate_quiz(&filters, use_error_notebook).await }).await?,
    )
}

/// Get the current quiz question.
#[utoipa::path(
    get,
    path = "/quiz",
    responses((status = 200, description = "Quiz view", body = Object))
)]
pub async fn get_quiz_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app_state.controller.quiz().await)
}

/// Answer the current question.
#[utoipa::path(
    post,
    path = "/quiz/answer",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer feedback", body = Object),
        (status = 400, description = "Option out of range"),
        (status = 409, description = "No quiz in progress, or question already answered")
    )
)]
pub async fn answer_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<AnswerRequest>,
) -> ApiResult<impl IntoResponse> {
    let controller = app_state.controller.clone();
    let feedback = run_detached(async move { controller.answer_quiz(payload.option_index).await })
        .await?
        .map_err(study_error)?;
    feedback.map(Json).ok_or_else(|| {
        warn!("Ignoring a second answer to the same question.");
        (
            StatusCode::CONFLICT,
            "This question was already answered".to_string(),
        )
    })
}

/// Move to the next question.
#[utoipa::path(
    post,
    path = "/quiz/next",
    responses((status = 200, description = "Whether the quiz advanced", body = NextResponse))
)]
pub async fn next_question_handler(State(app_state): State<Arc<AppState>>) -> Json<NextResponse> {
    Json(NextResponse {
        advanced: app_state.controller.next_question().await,
    })
}

/// Finish the quiz and show analytics.
#[utoipa::path(
    post,
    path = "/quiz/finish",
    responses((status = 204, description = "Quiz finished"))
)]
pub async fn finish_quiz_handler(State(app_state): State<Arc<AppState>>) -> StatusCode {
    app_state.controller.finish_quiz().await;
    StatusCode::NO_CONTENT
}

//=========================================================================================
// Error Notebook, Analytics and Research
//=========================================================================================

#[derive(Serialize)]
struct NotebookResponse {
    questions: Vec<study_assistant_core::QuizQuestion>,
    by_category: Vec<study_assistant_core::CategoryCount>,
}

/// List the error notebook.
#[utoipa::path(
    get,
    path = "/notebook",
    responses((status = 200, description = "Missed questions and per-category counts", body = Object))
)]
pub async fn get_notebook_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let controller = &app_state.controller;
    Json(NotebookResponse {
        questions: controller.error_notebook().await,
        by_category: controller.error_notebook_by_category().await,
    })
}

/// Start a quiz over the error notebook.
#[utoipa::path(
    post,
    path = "/notebook/review",
    responses((status = 200, description = "Which quiz source was used", body = Object))
)]
pub async fn review_notebook_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<QuizOutcome>> {
    quiz_response(app_state.controller.start_error_review().await)
}

/// Get performance per category.
#[utoipa::path(
    get,
    path = "/analytics",
    responses((status = 200, description = "Analytics report", body = Object))
)]
pub async fn get_analytics_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app_state.controller.analytics().await)
}

/// Search the library.
#[utoipa::path(
    post,
    path = "/research",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Search results", body = Object),
        (status = 400, description = "Blank query"),
        (status = 409, description = "Another generation is in progress")
    )
)]
pub async fn research_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ResearchRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query must not be blank".to_string()));
    }
    let controller = app_state.controller.clone();
    run_detached(async move { controller.search(&payload.query).await })
        .await?
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::CONFLICT,
                "Another generation is in progress".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::response::Response;
    use std::sync::Mutex;
    use study_assistant_core::{
        AnalyticsPolicy, Catalog, CompletionRequest, CompletionService, InMemoryStudyStore,
        PortError, PortResult, StudyController,
    };

    /// Replies with canned text in order.
    struct CannedCompletion {
        replies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionService for CannedCompletion {
        async fn complete(&self, _request: &CompletionRequest) -> PortResult<String> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(PortError::Unexpected("no reply left".to_string()));
            }
            Ok(replies.remove(0))
        }
    }

    const SUMMARY: &str = r#"{"title":"HAS","topic":"Cardiologia","sections":[],"examPearls":[]}"#;
    const QUIZ: &str = r#"[{"category":"Cardiologia","question":"Conduta?","options":["A","B"],"correctIndex":0,"explanation":"A"}]"#;

    async fn app_state(replies: &[&str]) -> Arc<AppState> {
        let completion = Arc::new(CannedCompletion {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        });
        let catalog = Catalog::from_json(
            r#"[{"id":"1","name":"HAS","subject_area":"Cardiologia","media_type":"video","date":"2023-10-12","transcript":"Hipertensão"}]"#,
        )
        .unwrap();
        let controller = StudyController::load(
            Arc::new(catalog),
            completion,
            Arc::new(InMemoryStudyStore::new()),
            AnalyticsPolicy::SessionOnly,
        )
        .await;
        Arc::new(AppState::new(controller))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn library_lists_documents_without_transcripts() {
        let state = app_state(&[]).await;
        let response = list_documents_handler(State(state), Query(LibraryQuery { subject: None }))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["subject_areas"][0], "Cardiologia");
        assert_eq!(body["documents"][0]["media_type"], "video");
        assert_eq!(body["documents"][0]["has_summary"], false);
        assert!(body["documents"][0].get("transcript").is_none());
    }

    #[tokio::test]
    async fn library_filters_by_subject() {
        let state = app_state(&[]).await;
        let query = LibraryQuery { subject: Some("Pediatria".to_string()) };
        let body = body_json(list_documents_handler(State(state.clone()), Query(query)).await.into_response()).await;
        assert_eq!(body["documents"].as_array().unwrap().len(), 0);

        let query = LibraryQuery { subject: Some("Cardiologia".to_string()) };
        let body = body_json(list_documents_handler(State(state), Query(query)).await.into_response()).await;
        assert_eq!(body["documents"][0]["id"], "1");
    }

    #[tokio::test]
    async fn failed_summary_is_not_listed_as_generated() {
        let state = app_state(&["not json"]).await;
        let response = select_document_handler(State(state.clone()), Path("1".to_string()))
            .await
            .into_response();
        assert_eq!(body_json(response).await["outcome"], "empty");

        let body = body_json(
            list_documents_handler(State(state), Query(LibraryQuery { subject: None }))
                .await
                .into_response(),
        )
        .await;
        let entry = &body["documents"][0];
        assert_eq!(entry["has_summary"], false);
        assert_eq!(entry["card_count"], 0);
        assert_eq!(entry["has_mind_map"], false);
    }

    #[tokio::test]
    async fn selecting_generates_then_reuses_the_summary() {
        let state = app_state(&[SUMMARY]).await;
        let response = select_document_handler(State(state.clone()), Path("1".to_string()))
            .await
            .into_response();
        assert_eq!(body_json(response).await["outcome"], "generated");

        let response = select_document_handler(State(state.clone()), Path("1".to_string()))
            .await
            .into_response();
        assert_eq!(body_json(response).await["outcome"], "cached");

        let response = get_materials_handler(State(state), Path("1".to_string()))
            .await
            .into_response();
        assert_eq!(body_json(response).await["summary"]["title"], "HAS");
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let state = app_state(&[]).await;
        let response = select_document_handler(State(state), Path("9".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn document_views_are_refused_without_a_document() {
        let state = app_state(&[]).await;
        let payload = SetModeRequest { mode: ViewMode::Flashcards };
        let response = set_mode_handler(State(state), Json(payload)).await.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn quiz_round_trip_updates_notebook_and_analytics() {
        let state = app_state(&[SUMMARY, QUIZ]).await;
        select_document_handler(State(state.clone()), Path("1".to_string())).await.unwrap();

        let request = QuizRequest {
            specialty: String::new(),
            institution: String::new(),
            difficulty: String::new(),
            count: Some(3),
            use_error_notebook: false,
        };
        let response = generate_quiz_handler(State(state.clone()), Json(request)).await.into_response();
        let body = body_json(response).await;
        assert_eq!(body["kind"], "contextual");
        assert_eq!(body["questions"], 1);

        let response = answer_quiz_handler(State(state.clone()), Json(AnswerRequest { option_index: 1 }))
            .await
            .into_response();
        let body = body_json(response).await;
        assert_eq!(body["is_correct"], false);
        assert_eq!(body["notebook_change"], "added");

        let response = answer_quiz_handler(State(state.clone()), Json(AnswerRequest { option_index: 0 }))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(get_notebook_handler(State(state.clone())).await.into_response()).await;
        assert_eq!(body["by_category"][0]["count"], 1);

        let body = body_json(get_analytics_handler(State(state)).await.into_response()).await;
        assert_eq!(body["status"], "scored");
        assert_eq!(body["overall_percent"], 0);
    }

    #[tokio::test]
    async fn out_of_range_answer_is_a_bad_request() {
        let state = app_state(&[SUMMARY, QUIZ]).await;
        select_document_handler(State(state.clone()), Path("1".to_string())).await.unwrap();
        let request = QuizRequest {
            specialty: String::new(),
            institution: String::new(),
            difficulty: String::new(),
            count: None,
            use_error_notebook: false,
        };
        generate_quiz_handler(State(state.clone()), Json(request)).await.unwrap();
        let response = answer_quiz_handler(State(state), Json(AnswerRequest { option_index: 7 }))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_research_query_is_rejected() {
        let state = app_state(&[]).await;
        let payload = ResearchRequest { query: "  ".to_string() };
        let response = research_handler(State(state), Json(payload)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn review_is_missing_until_flashcards_exist() {
        let state = app_state(&[]).await;
        let response = get_review_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
