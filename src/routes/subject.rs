use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::subject_dto::{
    AddModuleRequest, CreateQuizRequest, CreateSubjectRequest, RenameModuleRequest,
    UpdateSubjectRequest,
};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::models::quiz::{Question, Quiz, DEFAULT_TIME_LIMIT_MINUTES};
use crate::AppState;

#[axum::debug_handler]
pub async fn create_subject(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let teacher_id = claims.user_id()?;
    let subject = state
        .subject_service
        .create_subject(teacher_id, &payload.name, &payload.code)
        .await?;
    tracing::info!(subject_id = %subject.id, teacher_id = %teacher_id, "Subject created");
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn list_teacher_subjects(
    State(state): State<AppState>,
    Path(teacher_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let subjects = state.subject_service.list_for_teacher(teacher_id).await?;
    Ok(Json(subjects))
}

/// Full subject payload including nested modules and quizzes; used by both
/// the teacher dashboard and the student module view.
pub async fn get_subject_details(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let subject = state.subject_service.get_subject(subject_id).await?;
    Ok(Json(subject))
}

#[axum::debug_handler]
pub async fn update_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
    Json(payload): Json<UpdateSubjectRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .subject_service
        .rename_subject(subject_id, &payload.name)
        .await?;
    Ok(Json(json!({ "message": "Subject updated successfully" })))
}

pub async fn delete_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.subject_service.delete_subject(subject_id).await?;
    Ok(Json(json!({ "message": "Subject deleted successfully" })))
}

#[axum::debug_handler]
pub async fn add_module(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
    Json(payload): Json<AddModuleRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let module = state
        .module_service
        .add_module(subject_id, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(module)))
}

#[axum::debug_handler]
pub async fn rename_module(
    State(state): State<AppState>,
    Path((subject_id, module_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RenameModuleRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .module_service
        .rename_module(subject_id, module_id, &payload.name)
        .await?;
    Ok(Json(json!({ "message": "Module updated successfully" })))
}

pub async fn delete_module(
    State(state): State<AppState>,
    Path((subject_id, module_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    state
        .module_service
        .delete_module(subject_id, module_id)
        .await?;
    Ok(Json(json!({ "message": "Module deleted successfully" })))
}

#[utoipa::path(
    post,
    path = "/api/quizzes",
    request_body = Json<serde_json::Value>,
    responses(
        (status = 201, description = "Quiz appended to the module's history, inactive"),
        (status = 400, description = "Malformed question set"),
        (status = 404, description = "Subject or module not found"),
        (status = 409, description = "Concurrent edit to the subject"),
    ),
)]
pub async fn create_quiz(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let questions: Vec<Question> = payload
        .questions
        .iter()
        .map(|q| Question {
            id: Uuid::new_v4(),
            question_type: q.question_type,
            prompt: q.prompt.clone(),
            details: q.details.clone(),
        })
        .collect();
    for question in &questions {
        question.check()?;
    }

    let quiz = Quiz {
        id: Uuid::new_v4(),
        questions,
        created_at: Utc::now(),
        time_limit_minutes: payload
            .time_limit_minutes
            .unwrap_or(DEFAULT_TIME_LIMIT_MINUTES),
        is_active: false,
    };

    let quiz = state
        .module_service
        .append_quiz(payload.subject_id, payload.module_id, quiz)
        .await?;
    tracing::info!(quiz_id = %quiz.id, module_id = %payload.module_id, "Quiz created");
    Ok((StatusCode::CREATED, Json(quiz)))
}

#[axum::debug_handler]
pub async fn toggle_quiz(
    State(state): State<AppState>,
    Path((subject_id, module_id, quiz_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let is_active = state
        .module_service
        .toggle_quiz_active(subject_id, module_id, quiz_id)
        .await?;
    Ok(Json(json!({
        "message": "Quiz status updated",
        "quiz_id": quiz_id,
        "is_active": is_active,
    })))
}
