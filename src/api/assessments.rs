use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Assignment;
use crate::db::types::EventKind;
use crate::repositories;
use crate::schemas::assessment::assessment_to_response;
use crate::schemas::assignment::{roster_item, AssignmentListItem, StartAssignmentRequest};
use crate::services::lifecycle::{assignment_status, ensure_can_start, AssignmentRef};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:assessment_id", get(get_assessment))
        .route("/:assessment_id/assignments", get(list_assignments))
        .route("/:assessment_id/assignments/start", post(start_assignment))
}

async fn get_assessment(
    Path(assessment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<crate::schemas::assessment::AssessmentResponse>, ApiError> {
    let assessment = fetch_assessment(&state, &assessment_id).await?;

    let questions = repositories::questions::list_by_assessment(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let choices = repositories::questions::list_choices_by_assessment(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch choices"))?;

    Ok(Json(assessment_to_response(assessment, questions, &choices)))
}

/// Teacher roster: one entry per enrollment of the class. Enrollments with
/// no persisted assignment yet appear as virtual entries without an id.
async fn list_assignments(
    Path(assessment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentListItem>>, ApiError> {
    let assessment = fetch_assessment(&state, &assessment_id).await?;

    let class_subject =
        repositories::class_subjects::find_by_id(state.db(), &assessment.class_subject_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch class subject"))?
            .ok_or_else(|| ApiError::NotFound("Class subject not found".to_string()))?;

    let enrollments = repositories::enrollments::list_by_class(state.db(), &class_subject.class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch enrollments"))?;
    let assignments = repositories::assignments::list_by_assessment(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignments"))?;

    let mut by_enrollment: HashMap<String, Assignment> = assignments
        .into_iter()
        .map(|assignment| (assignment.enrollment_id.clone(), assignment))
        .collect();

    let roster = enrollments
        .into_iter()
        .map(|enrollment| {
            let student_id = enrollment.student_id.clone();
            let reference = match by_enrollment.remove(&enrollment.id) {
                Some(assignment) => AssignmentRef::Persisted(assignment),
                None => {
                    AssignmentRef::Virtual { assessment_id: assessment.id.clone(), enrollment }
                }
            };
            roster_item(reference, student_id)
        })
        .collect();

    Ok(Json(roster))
}

/// The student's first interaction: materializes a virtual assignment if
/// needed, then moves it to `in_progress`. Idempotent; calling it again
/// while in progress changes nothing.
async fn start_assignment(
    Path(assessment_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<StartAssignmentRequest>,
) -> Result<Json<crate::schemas::assignment::AssignmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let assessment = fetch_assessment(&state, &assessment_id).await?;

    let enrollment = repositories::enrollments::find_by_id(state.db(), &payload.enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?
        .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    let class_subject =
        repositories::class_subjects::find_by_id(state.db(), &assessment.class_subject_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch class subject"))?
            .ok_or_else(|| ApiError::NotFound("Class subject not found".to_string()))?;

    if enrollment.class_id != class_subject.class_id {
        return Err(ApiError::BadRequest(
            "Enrollment does not belong to this assessment's class".to_string(),
        ));
    }

    let assignment = materialize_assignment(&state, &assessment_id, &enrollment.id).await?;

    ensure_can_start(assignment_status(&assignment))?;

    let now = primitive_now_utc();
    let started = repositories::assignments::mark_started(state.db(), &assignment.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start assignment"))?;
    if started {
        repositories::events::record(
            state.db(),
            &assignment.id,
            EventKind::Started,
            None,
            Some(&enrollment.student_id),
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record start event"))?;
    }

    let response =
        crate::api::assignments::helpers::assignment_detail(&state, &assignment.id).await?;
    Ok(Json(response))
}

/// Idempotent materialization: the losing racer's insert is a no-op and
/// both callers address the same persisted row afterwards.
pub(in crate::api) async fn materialize_assignment(
    state: &AppState,
    assessment_id: &str,
    enrollment_id: &str,
) -> Result<Assignment, ApiError> {
    let existing = repositories::assignments::find_by_assessment_and_enrollment(
        state.db(),
        assessment_id,
        enrollment_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?;

    if let Some(assignment) = existing {
        return Ok(assignment);
    }

    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();
    let created = repositories::assignments::create_if_absent(
        state.db(),
        repositories::assignments::CreateAssignment {
            id: &id,
            assessment_id,
            enrollment_id,
            assigned_at: now,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to materialize assignment"))?;

    let assignment = repositories::assignments::find_by_assessment_and_enrollment(
        state.db(),
        assessment_id,
        enrollment_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
    .ok_or_else(|| ApiError::Internal("Assignment missing after materialization".to_string()))?;

    if created {
        repositories::events::record(
            state.db(),
            &assignment.id,
            EventKind::Materialized,
            None,
            None,
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record materialization event"))?;
    }

    Ok(assignment)
}

pub(in crate::api) async fn fetch_assessment(
    state: &AppState,
    assessment_id: &str,
) -> Result<crate::db::models::Assessment, ApiError> {
    repositories::assessments::find_by_id(state.db(), assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
        .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))
}
