use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::subject::{JoinedSubject, Subject};
use crate::models::user::User;

/// Manages the joined-subjects list embedded in each student row. Same
/// read-modify-write shape as the module mutator, but without a version
/// token: concurrent joins by one student are last-write-wins.
#[derive(Clone)]
pub struct EnrollmentService {
    pool: PgPool,
}

impl EnrollmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_joined(&self, student_id: Uuid) -> Result<Vec<Uuid>> {
        let student = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Student {} not found", student_id)))?;
        Ok(student.joined_subject_ids())
    }

    async fn store_joined(&self, student_id: Uuid, joined: &[Uuid]) -> Result<()> {
        sqlx::query("UPDATE users SET joined_subjects = $1, updated_at = NOW() WHERE id = $2")
            .bind(serde_json::to_value(joined)?)
            .bind(student_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Joins the subject behind a human-typed code. An unknown code is a
    /// 404; joining twice is a 409.
    pub async fn join_by_code(&self, student_id: Uuid, code: &str) -> Result<Subject> {
        let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Invalid subject code".to_string()))?;

        let mut joined = self.load_joined(student_id).await?;
        if joined.contains(&subject.id) {
            return Err(Error::Conflict(
                "You have already joined this subject".to_string(),
            ));
        }
        joined.push(subject.id);
        self.store_joined(student_id, &joined).await?;

        tracing::info!(
            student_id = %student_id,
            subject_id = %subject.id,
            "Student joined subject"
        );
        Ok(subject)
    }

    pub async fn leave_subject(&self, student_id: Uuid, subject_id: Uuid) -> Result<()> {
        let mut joined = self.load_joined(student_id).await?;
        let position = joined
            .iter()
            .position(|id| *id == subject_id)
            .ok_or_else(|| Error::NotFound("You are not enrolled in this subject".to_string()))?;
        joined.remove(position);
        self.store_joined(student_id, &joined).await
    }

    /// The student's joined subjects with teacher names and full module
    /// payloads, in the order they were joined.
    pub async fn joined_subjects(&self, student_id: Uuid) -> Result<Vec<JoinedSubject>> {
        let joined = self.load_joined(student_id).await?;
        if joined.is_empty() {
            return Ok(Vec::new());
        }

        let subjects = sqlx::query_as::<_, JoinedSubject>(
            r#"
            SELECT s.id, s.name, s.code, u.name AS teacher_name, s.modules
            FROM subjects s
            JOIN users u ON s.teacher_id = u.id
            WHERE s.id = ANY($1)
            "#,
        )
        .bind(&joined)
        .fetch_all(&self.pool)
        .await?;

        // Preserve join order; the query returns rows in storage order.
        let mut ordered = Vec::with_capacity(subjects.len());
        for id in &joined {
            if let Some(subject) = subjects.iter().find(|s| s.id == *id) {
                ordered.push(subject.clone());
            }
        }
        Ok(ordered)
    }
}
