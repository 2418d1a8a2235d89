use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Assignment;
use crate::db::types::{DeliveryMode, ViolationTag};

pub(crate) const COLUMNS: &str = "\
    id, assessment_id, enrollment_id, assigned_at, started_at, submitted_at, \
    graded_at, score, security_violation, forced_submission, teacher_notes, \
    created_at, updated_at";

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) assessment_id: &'a str,
    pub(crate) enrollment_id: &'a str,
    pub(crate) assigned_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Idempotent materialization: a second racer hits the unique constraint
/// and simply refetches.
pub(crate) async fn create_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    assignment: CreateAssignment<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO assignments (
            id, assessment_id, enrollment_id, assigned_at, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6)
        ON CONFLICT (assessment_id, enrollment_id) DO NOTHING",
    )
    .bind(assignment.id)
    .bind(assignment.assessment_id)
    .bind(assignment.enrollment_id)
    .bind(assignment.assigned_at)
    .bind(assignment.created_at)
    .bind(assignment.updated_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Row-locked fetch used by answer writes so the submitted/graded check
/// stays atomic with respect to a concurrent submission.
pub(crate) async fn find_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {COLUMNS} FROM assignments WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_assessment_and_enrollment(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
    enrollment_id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {COLUMNS} FROM assignments WHERE assessment_id = $1 AND enrollment_id = $2"
    ))
    .bind(assessment_id)
    .bind(enrollment_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_by_assessment(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {COLUMNS} FROM assignments WHERE assessment_id = $1 ORDER BY created_at"
    ))
    .bind(assessment_id)
    .fetch_all(executor)
    .await
}

/// First-interaction transition; a no-op when already started.
pub(crate) async fn mark_started(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE assignments
         SET started_at = $1, updated_at = $1
         WHERE id = $2 AND started_at IS NULL AND submitted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// The one-way submission gate. The state guard lives in the WHERE clause
/// so exactly one of two concurrent submitters can win.
pub(crate) async fn mark_submitted(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    submitted_at: PrimitiveDateTime,
    violation: Option<ViolationTag>,
    forced: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE assignments
         SET submitted_at = $1,
             security_violation = $2,
             forced_submission = $3,
             updated_at = $1
         WHERE id = $4 AND submitted_at IS NULL AND started_at IS NOT NULL",
    )
    .bind(submitted_at)
    .bind(violation)
    .bind(forced)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn set_score(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    score: f64,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE assignments SET score = $1, updated_at = $2 WHERE id = $3")
        .bind(score)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn set_teacher_notes(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    notes: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE assignments SET teacher_notes = $1, updated_at = $2 WHERE id = $3")
        .bind(notes)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn finalize(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    score: f64,
    graded_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE assignments
         SET score = $1, graded_at = $2, updated_at = $2
         WHERE id = $3 AND submitted_at IS NOT NULL AND graded_at IS NULL",
    )
    .bind(score)
    .bind(graded_at)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns a force-submitted assignment to `in_progress`, keeping answers.
pub(crate) async fn reopen(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE assignments
         SET submitted_at = NULL,
             graded_at = NULL,
             score = NULL,
             security_violation = NULL,
             forced_submission = FALSE,
             updated_at = $1
         WHERE id = $2 AND submitted_at IS NOT NULL AND forced_submission = TRUE",
    )
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Fresh attempt on the same row: only reachable when no answers exist.
pub(crate) async fn reassign(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE assignments
         SET assigned_at = $1,
             started_at = NULL,
             submitted_at = NULL,
             graded_at = NULL,
             score = NULL,
             security_violation = NULL,
             forced_submission = FALSE,
             updated_at = $1
         WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// An in-progress assignment joined with the timing fields the deadline
/// sweeper needs.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct OpenAssignmentTiming {
    pub(crate) assignment_id: String,
    pub(crate) delivery_mode: DeliveryMode,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) due_at: PrimitiveDateTime,
    pub(crate) duration_minutes: Option<i32>,
}

pub(crate) async fn list_open_with_timing(
    pool: &PgPool,
) -> Result<Vec<OpenAssignmentTiming>, sqlx::Error> {
    sqlx::query_as::<_, OpenAssignmentTiming>(
        "SELECT a.id AS assignment_id,
                ax.delivery_mode,
                a.started_at,
                ax.due_at,
                ax.duration_minutes
         FROM assignments a
         JOIN assessments ax ON ax.id = a.assessment_id
         WHERE a.started_at IS NOT NULL AND a.submitted_at IS NULL",
    )
    .fetch_all(pool)
    .await
}

/// One graded assignment with everything subject aggregation needs.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct GradedAssignmentRow {
    pub(crate) assessment_id: String,
    pub(crate) assessment_title: String,
    pub(crate) score: f64,
    pub(crate) total_points: f64,
    pub(crate) coefficient: f64,
    pub(crate) graded_at: PrimitiveDateTime,
}

pub(crate) async fn list_graded_for_subject(
    pool: &PgPool,
    class_subject_id: &str,
    student_id: &str,
    as_of: PrimitiveDateTime,
) -> Result<Vec<GradedAssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, GradedAssignmentRow>(
        "SELECT a.assessment_id,
                ax.title AS assessment_title,
                COALESCE(a.score, 0) AS score,
                COALESCE((SELECT SUM(q.points) FROM questions q WHERE q.assessment_id = ax.id), 0)
                    AS total_points,
                ax.coefficient,
                a.graded_at
         FROM assignments a
         JOIN assessments ax ON ax.id = a.assessment_id
         JOIN enrollments e ON e.id = a.enrollment_id
         WHERE ax.class_subject_id = $1
           AND e.student_id = $2
           AND a.graded_at IS NOT NULL
           AND a.graded_at <= $3
         ORDER BY a.graded_at",
    )
    .bind(class_subject_id)
    .bind(student_id)
    .bind(as_of)
    .fetch_all(pool)
    .await
}
