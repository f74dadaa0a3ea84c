use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::thread_rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::attempt_dto::{
    AttemptQuestion, BeginAttemptResponse, SubmitAttemptResponse, SubmittedAnswer,
};
use crate::error::{Error, Result};
use crate::models::attempt::{QuizAttempt, STATUS_EXPIRED, STATUS_IN_PROGRESS, STATUS_SUBMITTED};
use crate::models::quiz::{Question, QuestionDetails, Quiz, POINTS_PER_QUESTION};
use crate::models::score::Score;
use crate::models::subject::Subject;

/// Submissions arriving this close after the deadline are still accepted;
/// the client's auto-submit fires at zero and has to cross the network.
const DEADLINE_GRACE_SECONDS: i64 = 5;

type TimerRegistry = Arc<Mutex<HashMap<Uuid, tokio::task::JoinHandle<()>>>>;

/// Drives an attempt through `in_progress -> submitted | expired`.
///
/// Each attempt owns its own deadline timer task, registered here and
/// aborted the moment a submission is accepted. Both the timer and a
/// manual submission finalize through the same status-guarded UPDATE, so
/// whichever lands second is a no-op and at most one Score row is ever
/// written per attempt.
#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
    timers: TimerRegistry,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Opens an attempt on an active quiz: re-checks `is_active` against
    /// the stored subject (the gate is not trusted to the client), draws a
    /// fresh random question order, and pins the deadline.
    pub async fn begin_attempt(
        &self,
        student_id: Uuid,
        subject_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<BeginAttemptResponse> {
        let subject = self.fetch_subject(subject_id).await?;
        let (_module_name, quiz) = resolve_quiz(&subject, quiz_id)?;

        if !quiz.is_active {
            return Err(Error::Forbidden(
                "Quiz is not open for attempts".to_string(),
            ));
        }

        let now = Utc::now();
        let deadline = now + Duration::minutes(quiz.time_limit_minutes as i64);

        let attempt: QuizAttempt = sqlx::query_as(
            r#"
            INSERT INTO quiz_attempts (id, student_id, quiz_id, subject_id, status, started_at, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(quiz_id)
        .bind(subject_id)
        .bind(STATUS_IN_PROGRESS)
        .bind(now)
        .bind(deadline)
        .fetch_one(&self.pool)
        .await?;

        self.schedule_expiry(attempt.id, deadline);

        let questions = shuffle_questions(&quiz.questions)
            .iter()
            .map(AttemptQuestion::from)
            .collect();

        tracing::info!(
            attempt_id = %attempt.id,
            quiz_id = %quiz_id,
            student_id = %student_id,
            %deadline,
            "Attempt started"
        );

        Ok(BeginAttemptResponse {
            attempt_id: attempt.id,
            quiz_id,
            time_limit_minutes: quiz.time_limit_minutes,
            deadline,
            questions,
        })
    }

    /// Finalizes an attempt with exactly one Score row.
    ///
    /// The status-guarded UPDATE is the at-most-once gate: a repeat call,
    /// or a call racing the expiry timer, matches zero rows and changes
    /// nothing.
    pub async fn submit_attempt(
        &self,
        student_id: Uuid,
        attempt_id: Uuid,
        answers: &[SubmittedAnswer],
    ) -> Result<SubmitAttemptResponse> {
        let attempt: QuizAttempt = sqlx::query_as("SELECT * FROM quiz_attempts WHERE id = $1")
            .bind(attempt_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Attempt {} not found", attempt_id)))?;

        if attempt.student_id != student_id {
            return Err(Error::Forbidden(
                "Attempt belongs to another student".to_string(),
            ));
        }

        let now = Utc::now();
        if now > attempt.deadline + Duration::seconds(DEADLINE_GRACE_SECONDS) {
            // Too late; the expiry path owns this attempt now.
            expire_attempt(&self.pool, attempt_id).await?;
            return Err(Error::Conflict("Attempt deadline has passed".to_string()));
        }

        let subject = self.fetch_subject(attempt.subject_id).await?;
        let (_module_name, quiz) = resolve_quiz(&subject, attempt.quiz_id)?;

        // Scored over the stored question order, not the per-attempt shuffle.
        let score = compute_score(&quiz.questions, answers);

        let mut tx = self.pool.begin().await?;
        let updated: Option<QuizAttempt> = sqlx::query_as(
            r#"
            UPDATE quiz_attempts
            SET status = $1, submitted_at = $2, score = $3
            WHERE id = $4 AND status = $5
            RETURNING *
            "#,
        )
        .bind(STATUS_SUBMITTED)
        .bind(now)
        .bind(score)
        .bind(attempt_id)
        .bind(STATUS_IN_PROGRESS)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            return Err(Error::Conflict(
                "Attempt has already been submitted or expired".to_string(),
            ));
        };

        let score_row: Score = sqlx::query_as(
            r#"
            INSERT INTO scores (id, student_id, quiz_id, subject_id, score, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(updated.student_id)
        .bind(updated.quiz_id)
        .bind(updated.subject_id)
        .bind(score)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        self.cancel_timer(attempt_id);

        tracing::info!(
            attempt_id = %attempt_id,
            score,
            max_score = quiz.max_score(),
            "Attempt submitted"
        );

        Ok(SubmitAttemptResponse {
            attempt_id,
            score: score_row.score,
            max_score: quiz.max_score(),
            submitted_at: score_row.submitted_at,
        })
    }

    /// Restart-safe backstop for timers lost with the process: finalizes
    /// every overdue in-progress attempt. Expired attempts produce no
    /// Score row; the attempt is simply lost.
    pub async fn expire_overdue(&self) -> Result<u64> {
        let cutoff = Utc::now() - Duration::seconds(DEADLINE_GRACE_SECONDS);
        let result = sqlx::query(
            "UPDATE quiz_attempts SET status = $1 WHERE status = $2 AND deadline < $3",
        )
        .bind(STATUS_EXPIRED)
        .bind(STATUS_IN_PROGRESS)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        let expired = result.rows_affected();
        if expired > 0 {
            tracing::warn!(expired, "Expired overdue attempts without submission");
        }
        Ok(expired)
    }

    async fn fetch_subject(&self, subject_id: Uuid) -> Result<Subject> {
        sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Subject {} not found", subject_id)))
    }

    fn schedule_expiry(&self, attempt_id: Uuid, deadline: DateTime<Utc>) {
        let pool = self.pool.clone();
        let timers = self.timers.clone();
        let handle = tokio::spawn(async move {
            let fire_at = deadline + Duration::seconds(DEADLINE_GRACE_SECONDS);
            let wait = (fire_at - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            if let Err(e) = expire_attempt(&pool, attempt_id).await {
                tracing::warn!("Failed to expire attempt {}: {:?}", attempt_id, e);
            }
            timers
                .lock()
                .expect("attempt timer registry poisoned")
                .remove(&attempt_id);
        });
        self.timers
            .lock()
            .expect("attempt timer registry poisoned")
            .insert(attempt_id, handle);
    }

    fn cancel_timer(&self, attempt_id: Uuid) {
        if let Some(handle) = self
            .timers
            .lock()
            .expect("attempt timer registry poisoned")
            .remove(&attempt_id)
        {
            handle.abort();
        }
    }
}

async fn expire_attempt(pool: &PgPool, attempt_id: Uuid) -> Result<()> {
    let result =
        sqlx::query("UPDATE quiz_attempts SET status = $1 WHERE id = $2 AND status = $3")
            .bind(STATUS_EXPIRED)
            .bind(attempt_id)
            .bind(STATUS_IN_PROGRESS)
            .execute(pool)
            .await?;

    if result.rows_affected() > 0 {
        tracing::info!(attempt_id = %attempt_id, "Attempt expired without submission");
    }
    Ok(())
}

/// Locates a quiz anywhere in the subject's module list. Returns the
/// owning module's name alongside the quiz.
pub fn resolve_quiz(subject: &Subject, quiz_id: Uuid) -> Result<(String, Quiz)> {
    for module in subject.module_list() {
        if let Some(quiz) = module.quizzes.iter().find(|q| q.id == quiz_id) {
            return Ok((module.name.clone(), quiz.clone()));
        }
    }
    Err(Error::NotFound(format!(
        "Quiz {} not found in subject {}",
        quiz_id, subject.id
    )))
}

/// Uniform random permutation, drawn fresh per attempt and never persisted.
pub fn shuffle_questions(questions: &[Question]) -> Vec<Question> {
    let mut shuffled = questions.to_vec();
    shuffled.shuffle(&mut thread_rng());
    shuffled
}

/// Deterministic scoring over the quiz's own question order: a matching
/// multiple-choice index earns two points, anything else earns zero.
/// Fill-in-blank questions are never auto-scored.
pub fn compute_score(questions: &[Question], answers: &[SubmittedAnswer]) -> i32 {
    let by_question: HashMap<Uuid, &SubmittedAnswer> =
        answers.iter().map(|a| (a.question_id, a)).collect();

    let mut total = 0;
    for question in questions {
        let Some(answer) = by_question.get(&question.id) else {
            continue;
        };
        match &question.details {
            QuestionDetails::MultipleChoice(mc) => {
                if answer.selected_index == Some(mc.correct_index) {
                    total += POINTS_PER_QUESTION;
                }
            }
            QuestionDetails::FillInBlank(_) => {}
        }
    }
    total
}
