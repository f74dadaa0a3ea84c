use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const POINTS_PER_QUESTION: i32 = 2;
pub const DEFAULT_TIME_LIMIT_MINUTES: i32 = 5;
pub const MULTIPLE_CHOICE_OPTIONS: usize = 4;

/// A fixed, timed set of questions. Immutable once created except for the
/// `is_active` gate; replacing a quiz means appending a new one to the
/// owning module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: i32,
    #[serde(default)]
    pub is_active: bool,
}

fn default_time_limit() -> i32 {
    DEFAULT_TIME_LIMIT_MINUTES
}

impl Quiz {
    pub fn max_score(&self) -> i32 {
        self.questions.len() as i32 * POINTS_PER_QUESTION
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    #[serde(flatten)]
    pub details: QuestionDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    FillInBlank,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionDetails {
    MultipleChoice(MultipleChoiceDetails),
    FillInBlank(FillInBlankDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleChoiceDetails {
    pub options: Vec<String>,
    pub correct_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillInBlankDetails {
    pub expected_answer: String,
}

impl Question {
    /// Structural invariants checked when a quiz is created. Multiple-choice
    /// questions carry exactly four non-empty options and an in-range
    /// correct index.
    pub fn check(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(Error::BadRequest("Question prompt is empty".to_string()));
        }
        match (&self.question_type, &self.details) {
            (QuestionType::MultipleChoice, QuestionDetails::MultipleChoice(mc)) => {
                if mc.options.len() != MULTIPLE_CHOICE_OPTIONS {
                    return Err(Error::BadRequest(format!(
                        "Multiple-choice question must have exactly {} options",
                        MULTIPLE_CHOICE_OPTIONS
                    )));
                }
                if mc.options.iter().any(|o| o.trim().is_empty()) {
                    return Err(Error::BadRequest(
                        "Multiple-choice options must be non-empty".to_string(),
                    ));
                }
                if mc.correct_index < 0 || mc.correct_index as usize >= MULTIPLE_CHOICE_OPTIONS {
                    return Err(Error::BadRequest(format!(
                        "correct_index must be between 0 and {}",
                        MULTIPLE_CHOICE_OPTIONS - 1
                    )));
                }
                Ok(())
            }
            (QuestionType::FillInBlank, QuestionDetails::FillInBlank(fib)) => {
                if fib.expected_answer.trim().is_empty() {
                    return Err(Error::BadRequest(
                        "Fill-in-blank question must have an expected answer".to_string(),
                    ));
                }
                Ok(())
            }
            _ => Err(Error::BadRequest(
                "Question type does not match its details".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(options: Vec<&str>, correct_index: i32) -> Question {
        Question {
            id: Uuid::new_v4(),
            question_type: QuestionType::MultipleChoice,
            prompt: "What is 2+2?".to_string(),
            details: QuestionDetails::MultipleChoice(MultipleChoiceDetails {
                options: options.into_iter().map(String::from).collect(),
                correct_index,
            }),
        }
    }

    #[test]
    fn multiple_choice_requires_four_options() {
        assert!(mcq(vec!["1", "2", "3"], 0).check().is_err());
        assert!(mcq(vec!["1", "2", "3", "4"], 0).check().is_ok());
        assert!(mcq(vec!["1", "2", "3", "4", "5"], 0).check().is_err());
    }

    #[test]
    fn correct_index_must_be_in_range() {
        assert!(mcq(vec!["a", "b", "c", "d"], 4).check().is_err());
        assert!(mcq(vec!["a", "b", "c", "d"], -1).check().is_err());
        assert!(mcq(vec!["a", "b", "c", "d"], 3).check().is_ok());
    }

    #[test]
    fn blank_option_rejected() {
        assert!(mcq(vec!["a", "", "c", "d"], 0).check().is_err());
    }

    #[test]
    fn question_json_round_trips_with_type_tag() {
        let q = mcq(vec!["a", "b", "c", "d"], 2);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "multiple_choice");
        let back: Question = serde_json::from_value(json).unwrap();
        assert!(matches!(
            back.details,
            QuestionDetails::MultipleChoice(ref mc) if mc.correct_index == 2
        ));
    }
}
