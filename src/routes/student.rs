use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::{BeginAttemptRequest, SubmitAttemptRequest};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;

#[derive(Debug, serde::Deserialize, Validate)]
pub struct JoinSubjectRequest {
    #[validate(length(min = 1))]
    pub code: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct LeaveSubjectRequest {
    pub subject_id: Uuid,
}

/// Catalog of every subject, with teacher names, for the join-by-code view.
pub async fn list_subjects(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let subjects = state.subject_service.list_all_with_teacher().await?;
    Ok(Json(subjects))
}

#[axum::debug_handler]
pub async fn join_subject(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<JoinSubjectRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let student_id = claims.user_id()?;
    let subject = state
        .enrollment_service
        .join_by_code(student_id, payload.code.trim())
        .await?;
    Ok(Json(json!({
        "message": "Successfully joined subject!",
        "subject_id": subject.id,
        "subject_name": subject.name,
    })))
}

#[axum::debug_handler]
pub async fn leave_subject(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<LeaveSubjectRequest>,
) -> Result<impl IntoResponse> {
    let student_id = claims.user_id()?;
    state
        .enrollment_service
        .leave_subject(student_id, payload.subject_id)
        .await?;
    Ok(Json(json!({ "message": "Successfully left the subject" })))
}

pub async fn joined_subjects(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let subjects = state.enrollment_service.joined_subjects(student_id).await?;
    Ok(Json(subjects))
}

#[utoipa::path(
    post,
    path = "/api/attempts",
    request_body = Json<serde_json::Value>,
    responses(
        (status = 200, description = "Attempt context: shuffled questions and deadline"),
        (status = 403, description = "Quiz is not active"),
        (status = 404, description = "Subject or quiz not found"),
    ),
)]
pub async fn begin_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BeginAttemptRequest>,
) -> Result<impl IntoResponse> {
    let student_id = claims.user_id()?;
    let attempt = state
        .attempt_service
        .begin_attempt(student_id, payload.subject_id, payload.quiz_id)
        .await?;
    Ok(Json(attempt))
}

#[axum::debug_handler]
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse> {
    let student_id = claims.user_id()?;
    let result = state
        .attempt_service
        .submit_attempt(student_id, attempt_id, &payload.answers)
        .await?;
    Ok(Json(result))
}
