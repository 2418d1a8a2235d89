use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use time::PrimitiveDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::{parse_datetime_flexible, primitive_now_utc};
use crate::db::models::ClassSubject;
use crate::db::types::QuestionKind;
use crate::repositories;
use crate::schemas::assessment::{
    assessment_to_response, format_primitive, AssessmentCreate, AssessmentResponse,
    AssessmentSummaryResponse, QuestionCreate,
};
use crate::schemas::teaching::{
    period_to_response, CurrentTeacherResponse, ReplaceTeacherRequest, SubjectAverageItem,
    SubjectAverageResponse, TeachingPeriodResponse,
};
use crate::services::aggregation::{round_display, subject_average, GradedResult};
use crate::services::assignment_timing::normalize_duration_for_mode;
use crate::services::teaching_history;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/:class_subject_id/assessments",
            post(create_assessment).get(list_assessments),
        )
        .route("/:class_subject_id/teacher", put(replace_teacher).get(current_teacher))
        .route("/:class_subject_id/history", get(teaching_history_list))
        .route("/:class_subject_id/students/:student_id/average", get(student_subject_average))
}

#[derive(Debug, Deserialize)]
struct AsOfQuery {
    #[serde(default)]
    as_of: Option<String>,
}

impl AsOfQuery {
    fn resolve(&self) -> Result<PrimitiveDateTime, ApiError> {
        match &self.as_of {
            Some(raw) => parse_datetime_flexible(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("invalid as_of datetime: {raw}"))),
            None => Ok(primitive_now_utc()),
        }
    }
}

async fn create_assessment(
    Path(class_subject_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<AssessmentCreate>,
) -> Result<(StatusCode, Json<AssessmentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    fetch_class_subject(&state, &class_subject_id).await?;

    if payload.due_at <= payload.available_from {
        return Err(ApiError::BadRequest("due_at must be after available_from".to_string()));
    }

    let duration_minutes =
        normalize_duration_for_mode(payload.delivery_mode, payload.duration_minutes)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    for question in &payload.questions {
        check_question_invariants(question)?;
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let assessment_id = Uuid::new_v4().to_string();
    let assessment = repositories::assessments::create(
        &mut *tx,
        repositories::assessments::CreateAssessment {
            id: &assessment_id,
            class_subject_id: &class_subject_id,
            title: &payload.title,
            description: payload.description.as_deref(),
            coefficient: payload.coefficient,
            delivery_mode: payload.delivery_mode,
            duration_minutes,
            available_from: payload.available_from,
            due_at: payload.due_at,
            created_by: &payload.created_by,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assessment"))?;

    let mut questions = Vec::with_capacity(payload.questions.len());
    let mut choices = Vec::new();
    for question_payload in &payload.questions {
        let question_id = Uuid::new_v4().to_string();
        let question = repositories::questions::create(
            &mut *tx,
            repositories::questions::CreateQuestion {
                id: &question_id,
                assessment_id: &assessment_id,
                kind: question_payload.kind,
                prompt: &question_payload.prompt,
                points: question_payload.points,
                order_index: question_payload.order_index,
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

        for choice_payload in &question_payload.choices {
            let choice = repositories::questions::create_choice(
                &mut *tx,
                repositories::questions::CreateChoice {
                    id: &Uuid::new_v4().to_string(),
                    question_id: &question_id,
                    content: &choice_payload.content,
                    is_correct: choice_payload.is_correct,
                    order_index: choice_payload.order_index,
                    now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create choice"))?;
            choices.push(choice);
        }

        questions.push(question);
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok((StatusCode::CREATED, Json(assessment_to_response(assessment, questions, &choices))))
}

/// Choice-set invariants per question kind: selection kinds carry at least
/// two choices with the right number correct; text and file kinds carry
/// none at all.
fn check_question_invariants(question: &QuestionCreate) -> Result<(), ApiError> {
    let correct = question.choices.iter().filter(|choice| choice.is_correct).count();

    match question.kind {
        QuestionKind::SingleSelect | QuestionKind::Boolean => {
            if question.choices.len() < 2 {
                return Err(ApiError::BadRequest(format!(
                    "question '{}' needs at least 2 choices",
                    question.prompt
                )));
            }
            if correct != 1 {
                return Err(ApiError::BadRequest(format!(
                    "question '{}' must have exactly 1 correct choice",
                    question.prompt
                )));
            }
        }
        QuestionKind::MultiSelect => {
            if correct < 2 {
                return Err(ApiError::BadRequest(format!(
                    "question '{}' must have at least 2 correct choices",
                    question.prompt
                )));
            }
        }
        QuestionKind::Text | QuestionKind::FileUpload => {
            if !question.choices.is_empty() {
                return Err(ApiError::BadRequest(format!(
                    "question '{}' takes no choices",
                    question.prompt
                )));
            }
        }
    }

    Ok(())
}

async fn list_assessments(
    Path(class_subject_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssessmentSummaryResponse>>, ApiError> {
    fetch_class_subject(&state, &class_subject_id).await?;

    let rows =
        repositories::assessments::list_summaries_by_class_subject(state.db(), &class_subject_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch assessments"))?;

    Ok(Json(
        rows.into_iter()
            .map(|row| AssessmentSummaryResponse {
                id: row.id,
                title: row.title,
                coefficient: row.coefficient,
                delivery_mode: row.delivery_mode,
                duration_minutes: row.duration_minutes,
                available_from: format_primitive(row.available_from),
                due_at: format_primitive(row.due_at),
                total_points: row.total_points,
                question_count: row.question_count,
            })
            .collect(),
    ))
}

/// Closes the open teaching period at the effective date and opens a new
/// one. Replacements on the same pairing serialize on an advisory lock, so
/// the second of two concurrent writers sees the first one's committed
/// period and fails the forward-motion check.
async fn replace_teacher(
    Path(class_subject_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ReplaceTeacherRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    fetch_class_subject(&state, &class_subject_id).await?;
    repositories::users::find_by_id(state.db(), &payload.teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?
        .ok_or_else(|| ApiError::NotFound("Teacher not found".to_string()))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::teaching_periods::acquire_class_subject_lock(&mut *tx, &class_subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to acquire teaching history lock"))?;

    let open = repositories::teaching_periods::find_open(&mut *tx, &class_subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch open teaching period"))?;

    teaching_history::validate_replacement(open.as_ref(), payload.effective_date)?;

    let closed = match open {
        Some(period) => {
            repositories::teaching_periods::close(&mut *tx, &period.id, payload.effective_date)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to close teaching period"))?;
            Some(TeachingPeriodResponse {
                valid_to: Some(format_primitive(payload.effective_date)),
                ..period_to_response(period)
            })
        }
        None => None,
    };

    let current = repositories::teaching_periods::create(
        &mut *tx,
        repositories::teaching_periods::CreatePeriod {
            id: &Uuid::new_v4().to_string(),
            class_subject_id: &class_subject_id,
            teacher_id: &payload.teacher_id,
            valid_from: payload.effective_date,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create teaching period"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        class_subject_id = %class_subject_id,
        teacher_id = %payload.teacher_id,
        effective_date = %format_primitive(payload.effective_date),
        "Teacher of record replaced"
    );

    Ok(Json(serde_json::json!({
        "closed": closed,
        "current": period_to_response(current),
    })))
}

async fn current_teacher(
    Path(class_subject_id): Path<String>,
    Query(query): Query<AsOfQuery>,
    State(state): State<AppState>,
) -> Result<Json<CurrentTeacherResponse>, ApiError> {
    fetch_class_subject(&state, &class_subject_id).await?;
    let as_of = query.resolve()?;

    let periods =
        repositories::teaching_periods::list_by_class_subject(state.db(), &class_subject_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch teaching history"))?;

    let teacher_id = teaching_history::teacher_as_of(&periods, as_of).map(str::to_string);

    let teacher_name = match &teacher_id {
        Some(id) => repositories::users::find_by_id(state.db(), id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?
            .map(|user| user.full_name),
        None => None,
    };

    Ok(Json(CurrentTeacherResponse {
        class_subject_id,
        as_of: format_primitive(as_of),
        teacher_id,
        teacher_name,
    }))
}

async fn teaching_history_list(
    Path(class_subject_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeachingPeriodResponse>>, ApiError> {
    fetch_class_subject(&state, &class_subject_id).await?;

    let periods =
        repositories::teaching_periods::list_by_class_subject(state.db(), &class_subject_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch teaching history"))?;

    Ok(Json(periods.into_iter().map(period_to_response).collect()))
}

/// Normalized subject average for one student. Only graded work enters the
/// math; teaching history is consulted for attribution alone and never
/// changes a score.
async fn student_subject_average(
    Path((class_subject_id, student_id)): Path<(String, String)>,
    Query(query): Query<AsOfQuery>,
    State(state): State<AppState>,
) -> Result<Json<SubjectAverageResponse>, ApiError> {
    fetch_class_subject(&state, &class_subject_id).await?;
    let as_of = query.resolve()?;
    let scale = state.settings().grading().scale;

    let rows = repositories::assignments::list_graded_for_subject(
        state.db(),
        &class_subject_id,
        &student_id,
        as_of,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch graded assignments"))?;

    let results: Vec<GradedResult> = rows
        .iter()
        .map(|row| GradedResult {
            score: row.score,
            total_points: row.total_points,
            coefficient: row.coefficient,
        })
        .collect();

    let average = subject_average(&results, scale).map(round_display);

    let assessments = rows
        .into_iter()
        .filter(|row| row.total_points > 0.0)
        .map(|row| SubjectAverageItem {
            normalized: round_display(row.score / row.total_points * scale),
            assessment_id: row.assessment_id,
            title: row.assessment_title,
            score: row.score,
            total_points: row.total_points,
            coefficient: row.coefficient,
            graded_at: format_primitive(row.graded_at),
        })
        .collect();

    let periods =
        repositories::teaching_periods::list_by_class_subject(state.db(), &class_subject_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch teaching history"))?;
    let teacher_of_record = teaching_history::teacher_as_of(&periods, as_of).map(str::to_string);

    Ok(Json(SubjectAverageResponse {
        class_subject_id,
        student_id,
        as_of: format_primitive(as_of),
        scale,
        average,
        assessments,
        teacher_of_record,
    }))
}

async fn fetch_class_subject(
    state: &AppState,
    class_subject_id: &str,
) -> Result<ClassSubject, ApiError> {
    repositories::class_subjects::find_by_id(state.db(), class_subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch class subject"))?
        .ok_or_else(|| ApiError::NotFound("Class subject not found".to_string()))
}
