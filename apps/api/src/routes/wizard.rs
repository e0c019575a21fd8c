use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::ResumeFile;
use crate::form::FieldId;
use crate::models::profile::StoredProfile;
use crate::session::{self, FormView};
use crate::state::AppState;
use crate::transfer::export_text;

const NO_PROFILE_MESSAGE: &str =
    "No profile information found. Please complete the registration form first to generate a summary.";

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub field: FieldId,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub next: &'static str,
    pub profile: StoredProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub profile: Option<StoredProfile>,
    pub export_text: Option<String>,
    pub message: Option<&'static str>,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<FormView>) {
    (StatusCode::CREATED, Json(state.sessions.create().await))
}

/// GET /api/v1/sessions/:id/form
pub async fn handle_get_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormView>, AppError> {
    Ok(Json(state.sessions.view(id).await?))
}

/// PATCH /api/v1/sessions/:id/form
pub async fn handle_edit_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EditRequest>,
) -> Result<Json<FormView>, AppError> {
    Ok(Json(state.sessions.edit(id, req.field, &req.value).await?))
}

/// POST /api/v1/sessions/:id/resume
/// Multipart with the resume in field `file`.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<FormView>, AppError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?;
        file = Some(ResumeFile::new(file_name, content_type, bytes));
        break;
    }

    let file = file
        .filter(|f| !f.file_name.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Please upload a resume".to_string()))?;

    let view = session::upload_resume(
        &state.sessions,
        state.extractor.as_ref(),
        &state.transfer(id),
        id,
        file,
    )
    .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, AppError> {
    let profile = session::submit_profile(&state.sessions, &state.transfer(id), id).await?;
    Ok(Json(SubmitResponse {
        next: "/summary",
        profile,
    }))
}

/// GET /api/v1/sessions/:id/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<SummaryResponse> {
    state.sessions.keep_alive(id).await;
    let profile = state.transfer(id).load().await;
    let export = profile.as_ref().map(export_text);
    let message = profile.is_none().then_some(NO_PROFILE_MESSAGE);
    Json(SummaryResponse {
        profile,
        export_text: export,
        message,
    })
}

/// GET /api/v1/sessions/:id/summary/export
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.keep_alive(id).await;
    let profile = state
        .transfer(id)
        .load()
        .await
        .ok_or_else(|| AppError::NotFound("Profile data unavailable".to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        export_text(&profile),
    ))
}

/// POST /api/v1/sessions/:id/publish
pub async fn handle_publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let profile = state
        .transfer(id)
        .load()
        .await
        .ok_or_else(|| AppError::NotFound("Profile data unavailable".to_string()))?;
    state.extractor.publish(&profile).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    state.transfer(id).clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
