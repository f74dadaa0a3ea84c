use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::quiz::Quiz;

/// A named grouping of content inside a subject. Owns an append-only
/// history of quizzes; the last element is "the" quiz surfaced to students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}

impl Module {
    pub fn current_quiz(&self) -> Option<&Quiz> {
        self.quizzes.last()
    }
}
