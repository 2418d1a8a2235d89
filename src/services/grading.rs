use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Assignment;
use crate::db::types::EventKind;
use crate::repositories;
use crate::services::aggregation::{self, ProvisionalTotal};
use crate::services::error::{EngineError, EngineOpError};
use crate::services::lifecycle::{assignment_status, ensure_can_grade};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ManualGrade<'a> {
    pub(crate) score: f64,
    pub(crate) feedback: Option<&'a str>,
    pub(crate) graded_by: Option<&'a str>,
}

#[derive(Debug)]
pub(crate) struct GradeOutcome {
    pub(crate) assignment: Assignment,
    pub(crate) total: ProvisionalTotal,
    pub(crate) finalized: bool,
}

/// Records a teacher's score for one manually graded answer. Partial
/// grading persists without advancing state; supplying the last missing
/// manual score finalizes the assignment and recomputes the full total.
pub(crate) async fn grade_manual_answer(
    pool: &PgPool,
    assignment_id: &str,
    question_id: &str,
    grade: ManualGrade<'_>,
    now: PrimitiveDateTime,
) -> Result<GradeOutcome, EngineOpError> {
    let mut tx = pool.begin().await?;

    let assignment = repositories::assignments::find_for_update(&mut *tx, assignment_id)
        .await?
        .ok_or(EngineOpError::NotFound("assignment"))?;

    ensure_can_grade(assignment_status(&assignment))?;

    let question = repositories::questions::find_by_id(&mut *tx, question_id)
        .await?
        .filter(|question| question.assessment_id == assignment.assessment_id)
        .ok_or(EngineOpError::NotFound("question"))?;

    if question.kind.is_auto_gradable() {
        return Err(EngineError::InvalidAnswerShape(
            "only text and file questions take manual scores".to_string(),
        )
        .into());
    }
    if !(0.0..=question.points).contains(&grade.score) {
        return Err(EngineError::InvalidAnswerShape(format!(
            "score must be between 0 and {}",
            question.points
        ))
        .into());
    }

    let updated = repositories::answers::set_manual_score(
        &mut *tx,
        assignment_id,
        question_id,
        grade.score,
        grade.feedback,
        now,
    )
    .await?;
    if !updated {
        // Nothing was submitted for this question; there is no answer to grade.
        return Err(EngineOpError::NotFound("answer"));
    }

    repositories::events::record(
        &mut *tx,
        assignment_id,
        EventKind::ManualScore,
        Some(&format!("question {question_id}")),
        grade.graded_by,
        now,
    )
    .await?;

    let (total, finalized) = settle_total(&mut tx, &assignment, now).await?;

    let assignment = repositories::assignments::find_by_id(&mut *tx, assignment_id)
        .await?
        .ok_or(EngineOpError::NotFound("assignment"))?;

    tx.commit().await?;

    if finalized {
        metrics::counter!("assignments_graded_total").increment(1);
    }

    Ok(GradeOutcome { assignment, total, finalized })
}

/// Explicit `submitted → graded` attempt. Surfaces IncompleteGrading while
/// manual questions remain unscored instead of silently finalizing.
pub(crate) async fn finalize_assignment(
    pool: &PgPool,
    assignment_id: &str,
    teacher_notes: Option<&str>,
    actor: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<GradeOutcome, EngineOpError> {
    let mut tx = pool.begin().await?;

    let assignment = repositories::assignments::find_for_update(&mut *tx, assignment_id)
        .await?
        .ok_or(EngineOpError::NotFound("assignment"))?;

    ensure_can_grade(assignment_status(&assignment))?;

    let total = current_total(&mut tx, &assignment).await?;
    if !total.is_complete() {
        return Err(EngineError::IncompleteGrading { remaining: total.pending_manual }.into());
    }

    repositories::assignments::finalize(&mut *tx, assignment_id, total.score, now).await?;
    if let Some(notes) = teacher_notes {
        repositories::assignments::set_teacher_notes(&mut *tx, assignment_id, notes, now).await?;
    }
    repositories::events::record(&mut *tx, assignment_id, EventKind::Graded, None, actor, now)
        .await?;

    let assignment = repositories::assignments::find_by_id(&mut *tx, assignment_id)
        .await?
        .ok_or(EngineOpError::NotFound("assignment"))?;

    tx.commit().await?;

    metrics::counter!("assignments_graded_total").increment(1);

    Ok(GradeOutcome { assignment, total, finalized: true })
}

async fn current_total(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    assignment: &Assignment,
) -> Result<ProvisionalTotal, EngineOpError> {
    let questions =
        repositories::questions::list_by_assessment(&mut **tx, &assignment.assessment_id).await?;
    let answers = repositories::answers::list_by_assignment(&mut **tx, &assignment.id).await?;

    Ok(aggregation::assignment_total(aggregation::per_question_scores(&questions, &answers)))
}

async fn settle_total(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    assignment: &Assignment,
    now: PrimitiveDateTime,
) -> Result<(ProvisionalTotal, bool), EngineOpError> {
    let total = current_total(tx, assignment).await?;

    if total.is_complete() {
        repositories::assignments::finalize(&mut **tx, &assignment.id, total.score, now).await?;
        repositories::events::record(&mut **tx, &assignment.id, EventKind::Graded, None, None, now)
            .await?;
        Ok((total, true))
    } else {
        repositories::assignments::set_score(&mut **tx, &assignment.id, total.score, now).await?;
        Ok((total, false))
    }
}
