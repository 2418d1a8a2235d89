use anyhow::{Context, Result};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::ViolationTag;
use crate::repositories;
use crate::services::assignment_timing;
use crate::services::error::{EngineError, EngineOpError};
use crate::services::submission::{self, SubmitMode};

/// Force-submits every in-progress assignment whose hard deadline (plus
/// grace) has passed. The engine itself owns no clock; this sweeper is the
/// external scheduler that drives the forced-submission transition.
pub(crate) async fn force_submit_overdue(state: &AppState) -> Result<()> {
    let grace = state.settings().grading().submit_grace_period_seconds;
    let now = primitive_now_utc();

    let open = repositories::assignments::list_open_with_timing(state.db())
        .await
        .context("Failed to fetch open assignments")?;

    let mut forced = 0usize;

    for candidate in open {
        if !assignment_timing::is_past_deadline(
            candidate.delivery_mode,
            candidate.started_at,
            candidate.due_at,
            candidate.duration_minutes,
            grace,
            now,
        ) {
            continue;
        }

        match submission::submit_assignment(
            state.db(),
            &candidate.assignment_id,
            SubmitMode::Violation(ViolationTag::DeadlineExpired),
            now,
        )
        .await
        {
            Ok(_) => forced += 1,
            // A student submit won the race between our scan and the write.
            Err(EngineOpError::Domain(EngineError::InvalidTransition { .. })) => {
                tracing::debug!(
                    assignment_id = %candidate.assignment_id,
                    "Assignment submitted before the deadline sweep reached it"
                );
            }
            Err(err) => {
                tracing::error!(
                    assignment_id = %candidate.assignment_id,
                    error = %err,
                    "Failed to force-submit overdue assignment"
                );
            }
        }
    }

    if forced > 0 {
        tracing::info!(forced_assignments = forced, "Closed overdue assignments");
    }
    metrics::counter!("deadline_forced_submissions_total").increment(forced as u64);

    Ok(())
}
