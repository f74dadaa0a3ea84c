use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::quiz::{Question, QuestionDetails, QuestionType};

/// Question as surfaced to a student mid-attempt: the answer key
/// (correct index / expected text) is stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptQuestion {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    pub options: Option<Vec<String>>,
}

impl From<&Question> for AttemptQuestion {
    fn from(q: &Question) -> Self {
        let options = match &q.details {
            QuestionDetails::MultipleChoice(mc) => Some(mc.options.clone()),
            QuestionDetails::FillInBlank(_) => None,
        };
        Self {
            id: q.id,
            question_type: q.question_type,
            prompt: q.prompt.clone(),
            options,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BeginAttemptRequest {
    pub subject_id: Uuid,
    pub quiz_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct BeginAttemptResponse {
    pub attempt_id: Uuid,
    pub quiz_id: Uuid,
    pub time_limit_minutes: i32,
    pub deadline: DateTime<Utc>,
    pub questions: Vec<AttemptQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_index: Option<i32>,
    pub answer_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitAttemptResponse {
    pub attempt_id: Uuid,
    pub score: i32,
    pub max_score: i32,
    pub submitted_at: DateTime<Utc>,
}
