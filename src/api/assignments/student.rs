use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::types::EventKind;
use crate::repositories;
use crate::schemas::assignment::{
    answer_to_response, AnswerPayload, AnswerResponse, AssignmentResponse, ViolationRequest,
};
use crate::services::lifecycle::{assignment_status, ensure_can_record_answer, AssignmentStatus};
use crate::services::scoring::{validate_answer_shape, QuestionDef};
use crate::services::submission::{self, SubmitMode};

use super::helpers;

pub(super) async fn get_assignment(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let response = helpers::assignment_detail(&state, &assignment_id).await?;
    Ok(Json(response))
}

/// Records or overwrites one answer. The write starts a not-yet-started
/// assignment, holds the assignment row so a concurrent submission cannot
/// slip between the state check and the upsert, and resets any prior
/// score, since changed content invalidates the grade.
pub(super) async fn record_answer(
    Path((assignment_id, question_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(payload): Json<AnswerPayload>,
) -> Result<Json<AnswerResponse>, ApiError> {
    // Same guard the reference platform puts on auto-save traffic; a dead
    // Redis admits the write rather than blocking students.
    let interval = state.settings().grading().answer_save_interval_seconds.max(1);
    let rate_key = format!("answer-save:{assignment_id}");
    match state.redis().rate_limit(&rate_key, 1, interval).await {
        Ok(true) => {}
        Ok(false) => return Err(ApiError::TooManyRequests("Answer save rate limit exceeded")),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to check answer-save rate limit; allowing write");
        }
    }

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

    let status = assignment_status(&assignment);
    ensure_can_record_answer(status)?;

    let question = repositories::questions::find_by_id(&mut *tx, &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .filter(|question| question.assessment_id == assignment.assessment_id)
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let choices = repositories::questions::list_choices_by_question(&mut *tx, &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch choices"))?;

    let definition = QuestionDef::from_model(&question, &choices);
    validate_answer_shape(&definition, &payload.as_content())?;

    // First interaction: the write itself moves the assignment to
    // in_progress.
    if status == AssignmentStatus::NotStarted {
        repositories::assignments::mark_started(&mut *tx, &assignment_id, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to start assignment"))?;
        repositories::events::record(&mut *tx, &assignment_id, EventKind::Started, None, None, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to record start event"))?;
    }

    let answer = repositories::answers::upsert(
        &mut *tx,
        repositories::answers::UpsertAnswer {
            id: &Uuid::new_v4().to_string(),
            assignment_id: &assignment_id,
            question_id: &question_id,
            choice_id: payload.choice_id.as_deref(),
            selected_choice_ids: payload.selected_choice_ids.clone(),
            text_body: payload.text_body.as_deref(),
            file_reference: payload.file_reference.as_deref(),
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save answer"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("answers_recorded_total").increment(1);

    Ok(Json(answer_to_response(answer)))
}

pub(super) async fn submit_assignment(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let now = helpers::now_primitive();
    let outcome =
        submission::submit_assignment(state.db(), &assignment_id, SubmitMode::Voluntary, now)
            .await?;

    tracing::info!(
        assignment_id = %assignment_id,
        score = outcome.total.score,
        pending_manual = outcome.total.pending_manual,
        "Assignment submitted"
    );

    let response = helpers::assignment_detail(&state, &assignment_id).await?;
    Ok(Json(response))
}

/// Called synchronously by the proctoring client when it observes an
/// integrity violation. Whatever answers exist at this instant are
/// snapshotted and scored exactly like a voluntary submission; only the
/// provenance flags differ.
pub(super) async fn report_violation(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ViolationRequest>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let now = helpers::now_primitive();
    let outcome = submission::submit_assignment(
        state.db(),
        &assignment_id,
        SubmitMode::Violation(payload.violation),
        now,
    )
    .await?;

    tracing::warn!(
        assignment_id = %assignment_id,
        violation = payload.violation.as_str(),
        score = outcome.total.score,
        "Assignment force-submitted after security violation"
    );

    let response = helpers::assignment_detail(&state, &assignment_id).await?;
    Ok(Json(response))
}
