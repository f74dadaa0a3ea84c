use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::dto::auth_dto::{ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest};
use crate::error::{Error, Result};
use crate::middleware::auth::{issue_token, Claims};
use crate::models::user::Role;
use crate::AppState;

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .authenticate(&payload.email, &payload.password, payload.role)
        .await?;
    let role: Role = user.role.parse()?;
    let token = issue_token(user.id, role)?;
    tracing::info!(user_id = %user.id, role = %role, "User logged in");
    Ok(Json(LoginResponse { token, user }))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if payload.role == Role::Admin {
        return Err(Error::Forbidden(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }
    let user = state.user_service.create_user(payload).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = claims.user_id()?;
    state
        .user_service
        .change_password(user_id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
