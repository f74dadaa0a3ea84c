use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{Role, User};

#[derive(Debug, Serialize)]
pub struct PaginatedUsers {
    pub users: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub role: Role,
    pub roll: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordResponse {
    pub message: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub teachers: i64,
    pub students: i64,
    pub subjects: i64,
}
