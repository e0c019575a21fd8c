use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "wizard-api"
    }))
}

/// GET /
/// Landing step: what this demo does and where registration starts.
pub async fn landing_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "title": "Jobseeker Registration – Demo Portal",
        "extractor": state.extractor.name(),
        "notice": "This is not an official registration portal. No data is submitted anywhere.",
        "start": {
            "method": "POST",
            "href": "/api/v1/sessions"
        }
    }))
}
