use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable attempt result. Append-only; retakes insert new rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Score {
    pub id: Uuid,
    pub student_id: Uuid,
    pub quiz_id: Uuid,
    pub subject_id: Uuid,
    pub score: i32,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoreWithStudent {
    pub quiz_id: Uuid,
    pub score: i32,
    pub submitted_at: DateTime<Utc>,
    pub student_name: String,
    pub student_roll: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentScore {
    pub quiz_id: Uuid,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub score: i32,
    pub submitted_at: DateTime<Utc>,
}
