use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::subject::{Subject, SubjectWithTeacher};

#[derive(Clone)]
pub struct SubjectService {
    pool: PgPool,
}

impl SubjectService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_subject(
        &self,
        teacher_id: Uuid,
        name: &str,
        code: &str,
    ) -> Result<Subject> {
        let subject = sqlx::query_as::<_, Subject>(
            r#"
            INSERT INTO subjects (id, name, code, teacher_id, modules, version)
            VALUES ($1, $2, $3, $4, '[]'::jsonb, 1)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(code)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::Conflict("A subject with this code already exists".to_string())
            }
            other => Error::from(other),
        })?;
        Ok(subject)
    }

    pub async fn get_subject(&self, subject_id: Uuid) -> Result<Subject> {
        sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Subject {} not found", subject_id)))
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<Subject>> {
        let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(subject)
    }

    pub async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT * FROM subjects WHERE teacher_id = $1 ORDER BY created_at ASC",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }

    /// Catalog view for students: every subject with its teacher's display
    /// name, no module payload.
    pub async fn list_all_with_teacher(&self) -> Result<Vec<SubjectWithTeacher>> {
        let subjects = sqlx::query_as::<_, SubjectWithTeacher>(
            r#"
            SELECT s.id, s.name, s.code, u.name AS teacher_name
            FROM subjects s
            JOIN users u ON s.teacher_id = u.id
            ORDER BY s.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }

    pub async fn rename_subject(&self, subject_id: Uuid, name: &str) -> Result<()> {
        let result = sqlx::query("UPDATE subjects SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(subject_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Subject {} not found", subject_id)));
        }
        Ok(())
    }

    /// Deleting a subject does not cascade to its scores; orphaned score
    /// rows keep their subject_id.
    pub async fn delete_subject(&self, subject_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(subject_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Subject {} not found", subject_id)));
        }
        Ok(())
    }
}
