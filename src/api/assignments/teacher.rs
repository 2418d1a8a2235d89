use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::types::EventKind;
use crate::repositories;
use crate::schemas::assignment::{
    AssignmentResponse, FinalizeRequest, GradeResponse, LifecycleActionRequest, ManualGradeRequest,
};
use crate::services::grading::{self, ManualGrade};
use crate::services::lifecycle::{
    assignment_status, ensure_can_reassign, ensure_can_reopen,
};

use super::helpers;

/// Scores one manually graded answer. Partial progress persists without
/// advancing state; the last missing score finalizes the assignment.
pub(super) async fn grade_manual_answer(
    Path((assignment_id, question_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(payload): Json<ManualGradeRequest>,
) -> Result<Json<GradeResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = helpers::now_primitive();
    let outcome = grading::grade_manual_answer(
        state.db(),
        &assignment_id,
        &question_id,
        ManualGrade {
            score: payload.score,
            feedback: payload.feedback.as_deref(),
            graded_by: payload.graded_by.as_deref(),
        },
        now,
    )
    .await?;

    let assignment = helpers::assignment_detail(&state, &assignment_id).await?;
    Ok(Json(GradeResponse {
        finalized: outcome.finalized,
        pending_manual: outcome.total.pending_manual,
        assignment,
    }))
}

/// Explicit finalization. Rejected with IncompleteGrading while any
/// answered manual question is still unscored.
pub(super) async fn finalize_assignment(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<FinalizeRequest>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let now = helpers::now_primitive();
    grading::finalize_assignment(
        state.db(),
        &assignment_id,
        payload.teacher_notes.as_deref(),
        payload.actor.as_deref(),
        now,
    )
    .await?;

    let response = helpers::assignment_detail(&state, &assignment_id).await?;
    Ok(Json(response))
}

/// "The student was cut off unfairly, let them resume": only a supervised,
/// force-submitted assignment can return to in_progress. Answers survive;
/// timestamps and the aggregate score are cleared.
pub(super) async fn reopen_assignment(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<LifecycleActionRequest>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let assignment = helpers::fetch_assignment(&state, &assignment_id).await?;
    let assessment =
        crate::api::assessments::fetch_assessment(&state, &assignment.assessment_id).await?;

    ensure_can_reopen(&assignment, assessment.delivery_mode)?;

    let now = helpers::now_primitive();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let reopened = repositories::assignments::reopen(&mut *tx, &assignment_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to reopen assignment"))?;
    if !reopened {
        // Lost a race against another teacher action; report the real state.
        return Err(ApiError::Conflict("Assignment is no longer reopenable".to_string()));
    }

    repositories::events::record(
        &mut *tx,
        &assignment_id,
        EventKind::Reopened,
        Some(&payload.reason),
        payload.actor.as_deref(),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record reopen event"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(assignment_id = %assignment_id, reason = %payload.reason, "Assignment reopened");

    let response = helpers::assignment_detail(&state, &assignment_id).await?;
    Ok(Json(response))
}

/// Fresh attempt on the same row, legal only while nothing was answered.
pub(super) async fn reassign_assignment(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<LifecycleActionRequest>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = helpers::now_primitive();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let assignment = repositories::assignments::find_for_update(&mut *tx, &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    let answer_count = repositories::answers::count_by_assignment(&mut *tx, &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count answers"))?;

    ensure_can_reassign(assignment_status(&assignment), answer_count)?;

    repositories::assignments::reassign(&mut *tx, &assignment_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to reassign assignment"))?;
    repositories::events::record(
        &mut *tx,
        &assignment_id,
        EventKind::Reassigned,
        Some(&payload.reason),
        payload.actor.as_deref(),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record reassign event"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let response = helpers::assignment_detail(&state, &assignment_id).await?;
    Ok(Json(response))
}
