use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Assignment;
use crate::db::types::{EventKind, ViolationTag};
use crate::repositories;
use crate::services::aggregation::{self, ProvisionalTotal};
use crate::services::error::{EngineError, EngineOpError};
use crate::services::lifecycle::{assignment_status, ensure_can_submit};
use crate::services::scoring::{self, ScoreOutcome};

#[derive(Debug, Clone, Copy)]
pub(crate) enum SubmitMode {
    Voluntary,
    /// A detected integrity violation or an expired clock forces the
    /// submission; scoring is identical, only provenance differs.
    Violation(ViolationTag),
}

#[derive(Debug)]
pub(crate) struct SubmitOutcome {
    pub(crate) assignment: Assignment,
    pub(crate) total: ProvisionalTotal,
}

/// The `in_progress → submitted` transition: snapshots whatever answers
/// exist, auto-scores them, and stores the provisional total. Exactly one
/// of two concurrent submitters wins; the loser observes InvalidTransition.
/// When no manual question awaits a teacher the assignment finalizes in
/// the same step.
pub(crate) async fn submit_assignment(
    pool: &PgPool,
    assignment_id: &str,
    mode: SubmitMode,
    now: PrimitiveDateTime,
) -> Result<SubmitOutcome, EngineOpError> {
    let mut tx = pool.begin().await?;

    let assignment = repositories::assignments::find_for_update(&mut *tx, assignment_id)
        .await?
        .ok_or(EngineOpError::NotFound("assignment"))?;

    ensure_can_submit(assignment_status(&assignment))?;

    let (violation, forced) = match mode {
        SubmitMode::Voluntary => (None, false),
        SubmitMode::Violation(tag) => (Some(tag), true),
    };

    // The WHERE clause is the authoritative gate; with the row lock held
    // above it cannot fail, but a zero-row update must never pass silently.
    let updated =
        repositories::assignments::mark_submitted(&mut *tx, assignment_id, now, violation, forced)
            .await?;
    if !updated {
        return Err(EngineError::InvalidTransition {
            from: assignment_status(&assignment),
            action: "submit",
        }
        .into());
    }

    let questions =
        repositories::questions::list_by_assessment(&mut *tx, &assignment.assessment_id).await?;
    let choices =
        repositories::questions::list_choices_by_assessment(&mut *tx, &assignment.assessment_id)
            .await?;
    let answers = repositories::answers::list_by_assignment(&mut *tx, assignment_id).await?;

    // Auto-grade the snapshot. Unanswered questions stay absent; they are
    // not zero-filled rows.
    for question in &questions {
        let Some(answer) = answers.iter().find(|answer| answer.question_id == question.id) else {
            continue;
        };

        let definition = scoring::QuestionDef::from_model(question, &choices);
        let content = scoring::AnswerContent::from_model(answer);
        match scoring::score_answer(&definition, Some(&content))? {
            ScoreOutcome::Scored { score, .. } => {
                repositories::answers::set_auto_score(&mut *tx, &answer.id, score, now).await?;
            }
            ScoreOutcome::Manual => {}
        }
    }

    let answers = repositories::answers::list_by_assignment(&mut *tx, assignment_id).await?;
    let total = aggregation::assignment_total(aggregation::per_question_scores(&questions, &answers));

    let event = if forced { EventKind::ForcedSubmission } else { EventKind::Submitted };
    let reason = violation.map(|tag| format!("violation: {}", tag.as_str()));
    repositories::events::record(&mut *tx, assignment_id, event, reason.as_deref(), None, now)
        .await?;

    if total.is_complete() {
        repositories::assignments::finalize(&mut *tx, assignment_id, total.score, now).await?;
        repositories::events::record(&mut *tx, assignment_id, EventKind::Graded, None, None, now)
            .await?;
    } else {
        repositories::assignments::set_score(&mut *tx, assignment_id, total.score, now).await?;
    }

    let assignment = repositories::assignments::find_by_id(&mut *tx, assignment_id)
        .await?
        .ok_or(EngineOpError::NotFound("assignment"))?;

    tx.commit().await?;

    metrics::counter!("assignments_submitted_total").increment(1);
    if forced {
        metrics::counter!("assignments_forced_submissions_total").increment(1);
    }
    if total.is_complete() {
        metrics::counter!("assignments_graded_total").increment(1);
    }

    Ok(SubmitOutcome { assignment, total })
}
