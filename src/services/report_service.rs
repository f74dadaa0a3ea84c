use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::report_dto::{LeaderboardEntry, QuizReport, QuizSummary, StudentStats, SubjectReport};
use crate::error::{Error, Result};
use crate::models::score::{ScoreWithStudent, StudentScore};
use crate::models::subject::Subject;

pub const LEADERBOARD_SIZE: usize = 5;

/// Maximum score under the 5-question / 2-points-per-question convention.
/// The histogram buckets below are hardcoded to it and do not generalize
/// to other question counts.
const CONVENTIONAL_MAX_SCORE: f64 = 10.0;

#[derive(Clone)]
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Scores for a subject joined with student display data, newest first
    /// (the order the score viewer shows them in).
    pub async fn scores_for_subject(&self, subject_id: Uuid) -> Result<Vec<ScoreWithStudent>> {
        let scores = sqlx::query_as::<_, ScoreWithStudent>(
            r#"
            SELECT sc.quiz_id, sc.score, sc.submitted_at,
                   u.name AS student_name, u.roll AS student_roll
            FROM scores sc
            JOIN users u ON sc.student_id = u.id
            WHERE sc.subject_id = $1
            ORDER BY sc.submitted_at DESC
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(scores)
    }

    pub async fn scores_for_student(&self, student_id: Uuid) -> Result<Vec<StudentScore>> {
        let scores = sqlx::query_as::<_, StudentScore>(
            r#"
            SELECT sc.quiz_id, sc.subject_id, s.name AS subject_name,
                   sc.score, sc.submitted_at
            FROM scores sc
            JOIN subjects s ON sc.subject_id = s.id
            WHERE sc.student_id = $1
            ORDER BY sc.submitted_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(scores)
    }

    pub async fn student_stats(&self, student_id: Uuid) -> Result<StudentStats> {
        let scores = self.scores_for_student(student_id).await?;
        Ok(student_stats_from(&scores))
    }

    /// Full per-quiz breakdown for a subject: summary, score-distribution
    /// histogram, and top-5 leaderboard for every quiz in every module.
    pub async fn subject_report(&self, subject_id: Uuid) -> Result<SubjectReport> {
        let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Subject {} not found", subject_id)))?;

        // Submission order; leaderboard ties resolve to the earlier attempt.
        let scores = sqlx::query_as::<_, ScoreWithStudent>(
            r#"
            SELECT sc.quiz_id, sc.score, sc.submitted_at,
                   u.name AS student_name, u.roll AS student_roll
            FROM scores sc
            JOIN users u ON sc.student_id = u.id
            WHERE sc.subject_id = $1
            ORDER BY sc.submitted_at ASC
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;

        let mut quizzes = Vec::new();
        for module in subject.module_list() {
            for quiz in &module.quizzes {
                let quiz_scores: Vec<ScoreWithStudent> = scores
                    .iter()
                    .filter(|s| s.quiz_id == quiz.id)
                    .cloned()
                    .collect();
                let values: Vec<i32> = quiz_scores.iter().map(|s| s.score).collect();
                quizzes.push(QuizReport {
                    quiz_id: quiz.id,
                    module_name: module.name.clone(),
                    summary: summarize(quiz.id, &scores),
                    histogram: histogram(&values),
                    leaderboard: leaderboard(&quiz_scores, LEADERBOARD_SIZE),
                });
            }
        }

        Ok(SubjectReport {
            subject_id,
            subject_name: subject.name,
            quizzes,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Attempt count and mean score for one quiz; `None` average when nobody
/// has attempted it.
pub fn summarize(quiz_id: Uuid, scores: &[ScoreWithStudent]) -> QuizSummary {
    let filtered: Vec<&ScoreWithStudent> =
        scores.iter().filter(|s| s.quiz_id == quiz_id).collect();
    let attempt_count = filtered.len();
    let average_score = if attempt_count == 0 {
        None
    } else {
        let sum: i64 = filtered.iter().map(|s| s.score as i64).sum();
        Some(round2(sum as f64 / attempt_count as f64))
    };
    QuizSummary {
        attempt_count,
        average_score,
    }
}

/// Buckets scores into the fixed ranges 0-2, 3-5, 6-8, 9-10.
pub fn histogram(scores: &[i32]) -> [u32; 4] {
    let mut buckets = [0u32; 4];
    for &score in scores {
        if score <= 2 {
            buckets[0] += 1;
        } else if score <= 5 {
            buckets[1] += 1;
        } else if score <= 8 {
            buckets[2] += 1;
        } else {
            buckets[3] += 1;
        }
    }
    buckets
}

/// Top `top_n` scores, descending; the sort is stable so ties keep their
/// submission order.
pub fn leaderboard(scores: &[ScoreWithStudent], top_n: usize) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<&ScoreWithStudent> = scores.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted
        .into_iter()
        .take(top_n)
        .map(|s| LeaderboardEntry {
            student_name: s.student_name.clone(),
            score: s.score,
        })
        .collect()
}

fn student_stats_from(scores: &[StudentScore]) -> StudentStats {
    if scores.is_empty() {
        return StudentStats {
            quizzes_taken: 0,
            average_percentage: None,
            best_subject: None,
        };
    }

    let sum: i64 = scores.iter().map(|s| s.score as i64).sum();
    let average_percentage =
        round2(sum as f64 / scores.len() as f64 / CONVENTIONAL_MAX_SCORE * 100.0);

    // Best subject by mean score.
    let mut per_subject: Vec<(Uuid, &str, i64, i64)> = Vec::new();
    for score in scores {
        match per_subject.iter_mut().find(|(id, _, _, _)| *id == score.subject_id) {
            Some(entry) => {
                entry.2 += score.score as i64;
                entry.3 += 1;
            }
            None => per_subject.push((
                score.subject_id,
                score.subject_name.as_str(),
                score.score as i64,
                1,
            )),
        }
    }
    let best_subject = per_subject
        .iter()
        .max_by(|a, b| {
            let mean_a = a.2 as f64 / a.3 as f64;
            let mean_b = b.2 as f64 / b.3 as f64;
            mean_a.partial_cmp(&mean_b).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(_, name, _, _)| name.to_string());

    StudentStats {
        quizzes_taken: scores.len(),
        average_percentage: Some(average_percentage),
        best_subject,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn score(quiz_id: Uuid, student: &str, value: i32, minutes_ago: i64) -> ScoreWithStudent {
        ScoreWithStudent {
            quiz_id,
            score: value,
            submitted_at: Utc::now() - Duration::minutes(minutes_ago),
            student_name: student.to_string(),
            student_roll: None,
        }
    }

    #[test]
    fn histogram_buckets_match_fixed_ranges() {
        assert_eq!(histogram(&[10, 10, 4, 6, 0]), [1, 1, 1, 2]);
    }

    #[test]
    fn histogram_of_empty_input_is_all_zero() {
        assert_eq!(histogram(&[]), [0, 0, 0, 0]);
    }

    #[test]
    fn summarize_without_attempts_has_no_average() {
        let quiz_id = Uuid::new_v4();
        let summary = summarize(quiz_id, &[]);
        assert_eq!(summary.attempt_count, 0);
        assert_eq!(summary.average_score, None);
    }

    #[test]
    fn summarize_rounds_to_two_decimals() {
        let quiz_id = Uuid::new_v4();
        let other_quiz = Uuid::new_v4();
        let scores = vec![
            score(quiz_id, "a", 10, 30),
            score(quiz_id, "b", 5, 20),
            score(quiz_id, "c", 4, 10),
            score(other_quiz, "d", 0, 5),
        ];
        let summary = summarize(quiz_id, &scores);
        assert_eq!(summary.attempt_count, 3);
        // 19 / 3 = 6.333...
        assert_eq!(summary.average_score, Some(6.33));
    }

    #[test]
    fn leaderboard_is_descending_and_truncated() {
        let quiz_id = Uuid::new_v4();
        let scores = vec![
            score(quiz_id, "low", 2, 50),
            score(quiz_id, "high", 10, 40),
            score(quiz_id, "mid", 6, 30),
            score(quiz_id, "other-high", 10, 20),
        ];
        let board = leaderboard(&scores, 3);
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].score, 10);
        assert_eq!(board[1].score, 10);
        assert_eq!(board[2].score, 6);
    }

    #[test]
    fn leaderboard_ties_keep_submission_order() {
        let quiz_id = Uuid::new_v4();
        // Submission order: first, second — both scored 8.
        let scores = vec![
            score(quiz_id, "first", 8, 60),
            score(quiz_id, "second", 8, 30),
        ];
        let board = leaderboard(&scores, 5);
        assert_eq!(board[0].student_name, "first");
        assert_eq!(board[1].student_name, "second");
    }

    #[test]
    fn student_stats_from_empty_scores() {
        let stats = student_stats_from(&[]);
        assert_eq!(stats.quizzes_taken, 0);
        assert_eq!(stats.average_percentage, None);
        assert_eq!(stats.best_subject, None);
    }

    #[test]
    fn student_stats_picks_best_subject_by_mean() {
        let maths = Uuid::new_v4();
        let physics = Uuid::new_v4();
        let mk = |subject_id: Uuid, name: &str, value: i32| StudentScore {
            quiz_id: Uuid::new_v4(),
            subject_id,
            subject_name: name.to_string(),
            score: value,
            submitted_at: Utc::now(),
        };
        let scores = vec![
            mk(maths, "Maths", 10),
            mk(maths, "Maths", 8),
            mk(physics, "Physics", 6),
            mk(physics, "Physics", 4),
        ];
        let stats = student_stats_from(&scores);
        assert_eq!(stats.quizzes_taken, 4);
        assert_eq!(stats.average_percentage, Some(70.0));
        assert_eq!(stats.best_subject.as_deref(), Some("Maths"));
    }
}
