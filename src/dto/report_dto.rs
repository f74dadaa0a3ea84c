use serde::Serialize;
use uuid::Uuid;

use crate::models::score::StudentScore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSummary {
    pub attempt_count: usize,
    /// Mean score rounded to two decimals; `None` renders as "N/A" when the
    /// quiz has no attempts.
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub student_name: String,
    pub score: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizReport {
    pub quiz_id: Uuid,
    pub module_name: String,
    pub summary: QuizSummary,
    pub histogram: [u32; 4],
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub quizzes: Vec<QuizReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportStudent {
    pub id: Uuid,
    pub name: String,
    pub roll: Option<String>,
}

/// The student report page joins user, stats, and score history, fetched
/// concurrently.
#[derive(Debug, Clone, Serialize)]
pub struct StudentReport {
    pub student: ReportStudent,
    pub stats: StudentStats,
    pub scores: Vec<StudentScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentStats {
    pub quizzes_taken: usize,
    /// Average percentage across attempts, rounded to two decimals.
    pub average_percentage: Option<f64>,
    pub best_subject: Option<String>,
}
