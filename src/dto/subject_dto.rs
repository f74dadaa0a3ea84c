use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::quiz::{QuestionDetails, QuestionType};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 3, max = 32))]
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddModuleRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenameModuleRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

/// Question as authored by a teacher; ids are assigned server-side when the
/// quiz is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestion {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    #[serde(flatten)]
    pub details: QuestionDetails,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    pub subject_id: Uuid,
    pub module_id: Uuid,
    #[validate(range(min = 1, max = 240))]
    pub time_limit_minutes: Option<i32>,
    #[validate(length(min = 1))]
    pub questions: Vec<CreateQuestion>,
}
