use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::admin_dto::{DashboardStats, PaginatedUsers, UpdateUserRequest};
use crate::dto::auth_dto::RegisterRequest;
use crate::error::{Error, Result};
use crate::models::user::{Role, User};
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::generate_password;

pub const RESET_PASSWORD_LENGTH: usize = 8;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, payload: RegisterRequest) -> Result<User> {
        let password_hash = hash_password(&payload.password)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, roll, joined_subjects)
            VALUES ($1, $2, $3, $4, $5, $6, '[]'::jsonb)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(password_hash)
        .bind(payload.role.as_str())
        .bind(&payload.roll)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::Conflict("User with this email already exists".to_string())
            }
            other => Error::from(other),
        })?;
        Ok(user)
    }

    /// Credential check for login. The role is part of the credential:
    /// logging into the wrong dashboard fails the same way a bad password
    /// does.
    pub async fn authenticate(&self, email: &str, password: &str, role: Role) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND role = $2")
            .bind(email)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::Unauthorized("Invalid credentials".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }
        Ok(user)
    }

    pub async fn list_users(
        &self,
        page: i64,
        limit: i64,
        search: Option<String>,
    ) -> Result<PaginatedUsers> {
        let offset = (page - 1) * limit;
        let search_term = format!("%{}%", search.unwrap_or_default());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE name ILIKE $1 OR email ILIKE $1",
        )
        .bind(&search_term)
        .fetch_one(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE name ILIKE $1 OR email ILIKE $1
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&search_term)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedUsers {
            users,
            total,
            page,
            limit,
        })
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {} not found", user_id)))
    }

    pub async fn update_user(&self, user_id: Uuid, payload: UpdateUserRequest) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $1, email = $2, role = $3, roll = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(payload.role.as_str())
        .bind(&payload.roll)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::Conflict("User with this email already exists".to_string())
            }
            other => Error::from(other),
        })?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", user_id)))?;
        Ok(user)
    }

    /// Deleting a user does not cascade; scores and subject references to
    /// the id are left behind.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    /// Generates a fresh random password and returns the plaintext so the
    /// admin can hand it to the user.
    pub async fn reset_password(&self, user_id: Uuid) -> Result<String> {
        let new_password = generate_password(RESET_PASSWORD_LENGTH);
        let password_hash = hash_password(&new_password)?;
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("User {} not found", user_id)));
        }
        Ok(new_password)
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self.get_user(user_id).await?;
        if !verify_password(current_password, &user.password_hash)? {
            return Err(Error::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }
        let password_hash = hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let teachers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(Role::Teacher.as_str())
            .fetch_one(&self.pool)
            .await?;
        let students: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(Role::Student.as_str())
            .fetch_one(&self.pool)
            .await?;
        let subjects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects")
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardStats {
            teachers,
            students,
            subjects,
        })
    }
}
