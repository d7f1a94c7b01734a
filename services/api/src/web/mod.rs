pub mod rest;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use rest::*;
use state::AppState;

/// Builds the API router over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/documents", get(list_documents_handler))
        .route("/documents/{id}/select", post(select_document_handler))
        .route("/materials/{id}", get(get_materials_handler))
        .route("/state", get(get_state_handler))
        .route("/state/mode", put(set_mode_handler))
        .route("/logout", post(logout_handler))
        .route("/summary/regenerate", post(regenerate_summary_handler))
        .route("/flashcards", post(generate_flashcards_handler))
        .route("/mindmap", post(generate_mind_map_handler))
        .route("/review", get(get_review_handler))
        .route("/review/flip", post(review_flip_handler))
        .route("/review/reveal", post(review_reveal_handler))
        .route("/review/rate", post(review_rate_handler))
        .route("/review/restart", post(review_restart_handler))
        .route("/quiz", post(generate_quiz_handler).get(get_quiz_handler))
        .route("/quiz/answer", post(answer_quiz_handler))
        .route("/quiz/next", post(next_question_handler))
        .route("/quiz/finish", post(finish_quiz_handler))
        .route("/notebook", get(get_notebook_handler))
        .route("/notebook/review", post(review_notebook_handler))
        .route("/analytics", get(get_analytics_handler))
        .route("/research", post(research_handler))
        .with_state(app_state)
}
