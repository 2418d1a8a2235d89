use crate::api::errors::ApiError;
pub(crate) use crate::core::time::primitive_now_utc as now_primitive;
use crate::core::state::AppState;
use crate::db::models::Assignment;
use crate::repositories;
use crate::schemas::assignment::{assignment_to_response, AssignmentResponse};
use crate::services::aggregation;

pub(crate) async fn fetch_assignment(
    state: &AppState,
    assignment_id: &str,
) -> Result<Assignment, ApiError> {
    repositories::assignments::find_by_id(state.db(), assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))
}

/// Full detail view: the assignment with its answers and the provisional
/// total derived from the current per-question scores.
pub(crate) async fn assignment_detail(
    state: &AppState,
    assignment_id: &str,
) -> Result<AssignmentResponse, ApiError> {
    let assignment = fetch_assignment(state, assignment_id).await?;

    let questions =
        repositories::questions::list_by_assessment(state.db(), &assignment.assessment_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let answers = repositories::answers::list_by_assignment(state.db(), assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;
    let events = repositories::events::list_by_assignment(state.db(), assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment events"))?;

    let total =
        aggregation::assignment_total(aggregation::per_question_scores(&questions, &answers));

    Ok(assignment_to_response(assignment, total, answers, events))
}
