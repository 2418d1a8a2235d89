use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::models::Assessment;
use crate::db::types::DeliveryMode;

pub(crate) const COLUMNS: &str = "\
    id, class_subject_id, title, description, coefficient, delivery_mode, \
    duration_minutes, available_from, due_at, created_by, created_at, updated_at";

pub(crate) struct CreateAssessment<'a> {
    pub(crate) id: &'a str,
    pub(crate) class_subject_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) coefficient: f64,
    pub(crate) delivery_mode: DeliveryMode,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) available_from: PrimitiveDateTime,
    pub(crate) due_at: PrimitiveDateTime,
    pub(crate) created_by: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    assessment: CreateAssessment<'_>,
) -> Result<Assessment, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!(
        "INSERT INTO assessments (
            id, class_subject_id, title, description, coefficient, delivery_mode,
            duration_minutes, available_from, due_at, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)
        RETURNING {COLUMNS}"
    ))
    .bind(assessment.id)
    .bind(assessment.class_subject_id)
    .bind(assessment.title)
    .bind(assessment.description)
    .bind(assessment.coefficient)
    .bind(assessment.delivery_mode)
    .bind(assessment.duration_minutes)
    .bind(assessment.available_from)
    .bind(assessment.due_at)
    .bind(assessment.created_by)
    .bind(assessment.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Assessment>, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!("SELECT {COLUMNS} FROM assessments WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Listing row with the computed point total; the total is never stored.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct AssessmentSummaryRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) coefficient: f64,
    pub(crate) delivery_mode: DeliveryMode,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) available_from: PrimitiveDateTime,
    pub(crate) due_at: PrimitiveDateTime,
    pub(crate) total_points: f64,
    pub(crate) question_count: i64,
}

pub(crate) async fn list_summaries_by_class_subject(
    executor: impl sqlx::PgExecutor<'_>,
    class_subject_id: &str,
) -> Result<Vec<AssessmentSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentSummaryRow>(
        "SELECT ax.id, ax.title, ax.coefficient, ax.delivery_mode, ax.duration_minutes,
                ax.available_from, ax.due_at,
                COALESCE(SUM(q.points), 0) AS total_points,
                COUNT(q.id) AS question_count
         FROM assessments ax
         LEFT JOIN questions q ON q.assessment_id = ax.id
         WHERE ax.class_subject_id = $1
         GROUP BY ax.id
         ORDER BY ax.due_at",
    )
    .bind(class_subject_id)
    .fetch_all(executor)
    .await
}
