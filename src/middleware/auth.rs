use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::user::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Role,
}

impl Claims {
    pub fn user_id(&self) -> crate::error::Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| crate::error::Error::Unauthorized("Malformed token subject".to_string()))
    }
}

pub fn issue_token(user_id: Uuid, role: Role) -> crate::error::Result<String> {
    let config = crate::config::get_config();
    let exp = (Utc::now() + chrono::Duration::hours(config.token_ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        role,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| crate::error::Error::Internal(format!("Failed to sign token: {}", e)))
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

fn decode_bearer(req: &Request) -> Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(unauthorized("missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(unauthorized("bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(unauthorized("unsupported_scheme"));
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Ok(data.claims),
        Err(_) => Err(unauthorized("invalid_token")),
    }
}

pub async fn require_auth(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

pub async fn require_teacher(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => match claims.role {
            Role::Teacher => {
                req.extensions_mut().insert(claims);
                next.run(req).await
            }
            Role::Student | Role::Admin => {
                (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response()
            }
        },
        Err(resp) => resp,
    }
}

pub async fn require_student(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => match claims.role {
            Role::Student => {
                req.extensions_mut().insert(claims);
                next.run(req).await
            }
            Role::Teacher | Role::Admin => {
                (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response()
            }
        },
        Err(resp) => resp,
    }
}

pub async fn require_admin(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => match claims.role {
            Role::Admin => {
                req.extensions_mut().insert(claims);
                next.run(req).await
            }
            Role::Teacher | Role::Student => {
                (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response()
            }
        },
        Err(resp) => resp,
    }
}
