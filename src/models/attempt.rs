use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_SUBMITTED: &str = "submitted";
pub const STATUS_EXPIRED: &str = "expired";

/// One student's timed engagement with an active quiz. The status column
/// carries the at-most-once submission guard: `in_progress` rows are the
/// only ones a submission or expiry can finalize.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub student_id: Uuid,
    pub quiz_id: Uuid,
    pub subject_id: Uuid,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub score: Option<i32>,
}
