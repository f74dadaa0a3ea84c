use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::admin_dto::{ResetPasswordResponse, UpdateUserRequest};
use crate::dto::auth_dto::RegisterRequest;
use crate::error::Result;
use crate::AppState;

#[derive(Debug, serde::Deserialize, Default)]
#[serde(default)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("search" = Option<String>, Query, description = "Substring match on name or email")
    ),
    responses(
        (status = 200, description = "Paginated user list", body = Json<serde_json::Value>),
    ),
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let result = state.user_service.list_users(page, limit, query.search).await?;
    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get_user(user_id).await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.update_user(user_id, payload).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.user_service.delete_user(user_id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let new_password = state.user_service.reset_password(user_id).await?;
    tracing::info!(user_id = %user_id, "Password reset by admin");
    Ok(Json(ResetPasswordResponse {
        message: "Password reset successfully".to_string(),
        new_password,
    }))
}

pub async fn dashboard_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.user_service.dashboard_stats().await?;
    Ok(Json(stats))
}
