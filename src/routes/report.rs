use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::dto::report_dto::{ReportStudent, StudentReport};
use crate::error::Result;
use crate::AppState;

/// Raw score rows for a subject, newest first, joined with student names.
pub async fn scores_for_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let scores = state.report_service.scores_for_subject(subject_id).await?;
    Ok(Json(scores))
}

pub async fn scores_for_student(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let scores = state.report_service.scores_for_student(student_id).await?;
    Ok(Json(scores))
}

/// Per-quiz analytics for a whole subject: attempt counts, averages,
/// score-distribution histograms, and leaderboards.
pub async fn subject_report(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let report = state.report_service.subject_report(subject_id).await?;
    Ok(Json(report))
}

/// Student report page payload: user, stats, and score history fetched
/// concurrently and joined here.
pub async fn student_report(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (user, stats, scores) = tokio::try_join!(
        state.user_service.get_user(student_id),
        state.report_service.student_stats(student_id),
        state.report_service.scores_for_student(student_id),
    )?;

    Ok(Json(StudentReport {
        student: ReportStudent {
            id: user.id,
            name: user.name,
            roll: user.roll,
        },
        stats,
        scores,
    }))
}
