pub mod health;
pub mod wizard;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::landing_handler))
        .route("/health", get(health::health_handler))
        // Registration step
        .route("/api/v1/sessions", post(wizard::handle_create_session))
        .route("/api/v1/sessions/:id", delete(wizard::handle_end_session))
        .route(
            "/api/v1/sessions/:id/form",
            get(wizard::handle_get_form).patch(wizard::handle_edit_field),
        )
        .route(
            "/api/v1/sessions/:id/resume",
            post(wizard::handle_upload_resume),
        )
        .route("/api/v1/sessions/:id/submit", post(wizard::handle_submit))
        // Summary step
        .route("/api/v1/sessions/:id/summary", get(wizard::handle_summary))
        .route(
            "/api/v1/sessions/:id/summary/export",
            get(wizard::handle_export),
        )
        .route("/api/v1/sessions/:id/publish", post(wizard::handle_publish))
        .with_state(state)
}
